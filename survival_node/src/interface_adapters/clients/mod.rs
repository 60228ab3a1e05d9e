// Outbound clients for services the node consumes.

pub mod narrator;
