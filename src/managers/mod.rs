// State managers
// Managers own stateful operations over persisted data.

pub mod route_history;
