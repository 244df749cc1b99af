pub mod new;
pub mod run;
