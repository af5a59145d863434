pub(crate) mod chat;
pub(crate) mod report;
pub(crate) mod run;
pub(crate) mod serve;
pub(crate) mod validate;
