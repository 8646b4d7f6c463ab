pub mod engine;
pub mod executor;
pub mod folders;
pub mod index;
pub mod registry;
pub mod retry;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_registry;
