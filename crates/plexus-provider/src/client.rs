use std::collections::HashMap;
use std::sync::Mutex;

use wreq::Client;

/// Caches one `wreq::Client` per distinct outbound proxy so a config hot
/// swap that changes the egress proxy for a provider doesn't require a
/// process restart; clients for proxies no longer referenced are simply
/// dropped the next time the cache is rebuilt.
pub struct UpstreamClientCache {
    clients: Mutex<HashMap<Option<String>, Client>>,
}

impl UpstreamClientCache {
    pub fn new() -> Self {
        Self { clients: Mutex::new(HashMap::new()) }
    }

    pub fn get_or_build(&self, proxy: Option<&str>) -> Client {
        let key = proxy.map(str::to_owned);
        let mut clients = self.clients.lock().unwrap();
        if let Some(client) = clients.get(&key) {
            return client.clone();
        }

        let mut builder = Client::builder();
        if let Some(proxy_url) = proxy {
            if let Ok(proxy) = wreq::Proxy::all(proxy_url) {
                builder = builder.proxy(proxy);
            }
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());
        clients.insert(key, client.clone());
        client
    }
}

impl Default for UpstreamClientCache {
    fn default() -> Self {
        Self::new()
    }
}
