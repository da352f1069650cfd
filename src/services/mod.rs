// Entity services: one module per table, each exposing the same
// fetch/insert/update/delete contract over the store client plus the query
// cache. Stateless by design - callers inject the client and cache.
pub mod projects;
pub mod tasks;
pub mod users;
