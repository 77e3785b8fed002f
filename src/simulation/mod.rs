pub mod random_log;
