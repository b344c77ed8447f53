mod common;
mod notify;
mod validation;
