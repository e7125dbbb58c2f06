//! Support code for database-backed tests. Compiled unconditionally so the integration suites and other
//! workspace members can set up throwaway databases.
pub mod prepare_env;
