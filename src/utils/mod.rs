pub mod employee_cache;
