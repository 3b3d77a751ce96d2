pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        token_secret: secrecy::SecretString,
        public_url: String,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
        verify_ttl_seconds: i64,
        reset_ttl_seconds: i64,
    },
}
