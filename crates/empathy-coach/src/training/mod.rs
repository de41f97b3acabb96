pub mod debrief;
