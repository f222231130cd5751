pub mod functions;
pub mod run;
