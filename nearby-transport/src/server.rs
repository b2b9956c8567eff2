const fn server_host() -> &'static str {
    if let Some(host) = option_env!("NEARBY_SERVER_HOST") {
        host
    } else {
        "localhost"
    }
}

const fn server_port() -> u16 {
    if let Some(port) = option_env!("NEARBY_SERVER_PORT") {
        const_str::parse!(port, u16)
    } else {
        5050
    }
}

const fn server_secure() -> bool {
    if let Some(secure) = option_env!("NEARBY_SERVER_SECURE") {
        const_str::eq_ignore_ascii_case!(secure, "true") || const_str::equal!(secure, "1")
    } else {
        false
    }
}

pub const DEFAULT_HOST: &str = server_host();
pub const DEFAULT_PORT: u16 = server_port();
pub const DEFAULT_SECURE: bool = server_secure();

/// Where the location backend lives, defaults are baked in at compile time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secure: DEFAULT_SECURE,
        }
    }
}

impl ServerEndpoint {
    fn ws_proto(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }

    fn http_proto(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("{}://{}:{}{path}", self.http_proto(), self.host, self.port)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("{}://{}:{}{path}", self.ws_proto(), self.host, self.port)
    }
}
