use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

const PAYLOAD_TEMPLATE: &str =
    "GET / HTTP/1.1[crlf]Host: maritimavpn.shop[crlf]Connection: Upgrade[crlf]Upgrade: websocket[crlf][crlf]";

/// Generates HTTP Injector (.ehi) configuration blobs.
///
/// Pure function of its inputs: no I/O and no randomness, so renewal can
/// regenerate the blob for an existing account and get the same bytes.
#[derive(Debug, Clone)]
pub struct EhiGenerator {
    ssh_host: String,
    proxy_host: String,
    proxy_port: u16,
}

impl EhiGenerator {
    pub fn new(ssh_host: String, proxy_host: String, proxy_port: u16) -> Self {
        Self {
            ssh_host,
            proxy_host,
            proxy_port,
        }
    }

    /// Base64-encoded configuration document for client import.
    pub fn generate(&self, username: &str, password: &str, plan: &str) -> String {
        let doc = json!({
            "settings": {
                "proxy": {
                    "host": self.proxy_host,
                    "port": self.proxy_port,
                },
                "payload": PAYLOAD_TEMPLATE,
                "proxy_mode": "custom_payload",
                "use_payload": true,
                "ssh": {
                    "host": self.ssh_host,
                    "port": 22,
                    "username": username,
                    "password": password,
                },
                "dns": false,
                "tls": false,
                "vpn": false,
            },
            "meta": {
                "name": format!("MaritimaVPN - Plano {plan} dias"),
                "author": "MaritimaVPN",
                "description": "Configuracao gerada automaticamente",
            },
        });

        STANDARD.encode(doc.to_string())
    }
}
