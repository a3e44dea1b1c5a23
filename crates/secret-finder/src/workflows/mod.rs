pub mod leads;
pub mod outreach;
pub mod watch;
