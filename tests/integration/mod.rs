//! Integration tests for page composition

mod config_loading;
mod http_fragments;
mod one_of_many;
mod test_utils;
