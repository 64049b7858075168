mod build_config;
mod parse_credentials;
mod parse_storage;
