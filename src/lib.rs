pub mod calendar;
pub mod db;
pub mod helpers;
pub mod message_sender;
pub mod models;
pub mod projector;
pub mod scheduler;
pub mod teachers;
pub mod timetable;
pub mod timetable_getter;
