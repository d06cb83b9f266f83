// Wire protocols consumed by CoWrite clients.

pub mod cloud;
