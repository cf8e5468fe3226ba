pub mod month;
pub mod monthly_variable;
pub mod profile;
pub mod region;
pub mod variable;
