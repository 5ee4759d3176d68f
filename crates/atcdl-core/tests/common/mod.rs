#![allow(dead_code)]

pub mod archive_server;
pub mod mock_fetch;
