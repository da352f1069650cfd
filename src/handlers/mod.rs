// Page handlers in two tiers, mirroring the route guard's view of the world:
// public pages render without a session, protected pages sit behind it.
pub mod protected;
pub mod public;
