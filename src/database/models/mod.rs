pub mod courier;
pub mod delivery;
pub mod organization;
pub mod organization_user;
pub mod ticket;
pub mod vehicle;

pub use courier::Courier;
pub use delivery::Delivery;
pub use organization::{Organization, SubscriptionPlan, SubscriptionStatus};
pub use organization_user::{OrgRole, OrganizationUser};
pub use ticket::Ticket;
pub use vehicle::Vehicle;
