pub mod accessor;
pub mod broker;
pub mod dispatcher;
pub mod fan_out;
pub mod seeder;
