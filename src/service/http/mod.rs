use reqwest::{
    cookie::Jar,
    header::{self, HeaderMap, HeaderValue},
    Client, IntoUrl, Response,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use url::Url;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const INSTAGRAM_APP_ID: &str = "936619743392459";

/// Cookie-backed client used for everything that talks to Instagram itself.
#[derive(Clone)]
pub struct HttpService {
    client: Client,
    cookie_jar: Arc<Jar>,
}

impl HttpService {
    pub fn new(
        base_url: &Url,
        timeout: Duration,
        connect_timeout: Duration,
        proxy: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let cookie_jar = Arc::new(Jar::default());

        let builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .cookie_provider(Arc::clone(&cookie_jar))
            .default_headers(Self::instagram_headers(base_url))
            .user_agent(BROWSER_USER_AGENT);

        let client = build_client(builder, proxy)?;

        Ok(Self { client, cookie_jar })
    }

    fn instagram_headers(base_url: &Url) -> HeaderMap {
        let origin = base_url.origin().ascii_serialization();

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("X-IG-App-ID", HeaderValue::from_static(INSTAGRAM_APP_ID));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Ok(value) = HeaderValue::from_str(&origin) {
            headers.insert(header::ORIGIN, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}/", origin)) {
            headers.insert(header::REFERER, value);
        }
        headers.insert(
            "Sec-Ch-Ua",
            HeaderValue::from_static("\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\""),
        );
        headers.insert("Sec-Ch-Ua-Mobile", HeaderValue::from_static("?0"));
        headers.insert("Sec-Ch-Ua-Platform", HeaderValue::from_static("\"Windows\""));
        headers
    }

    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.cookie_jar)
    }

    pub async fn get(&self, url: impl IntoUrl) -> Result<Response, reqwest::Error> {
        self.client.get(url).send().await
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        url: impl IntoUrl,
        query: &Q,
    ) -> Result<Response, reqwest::Error> {
        self.client.get(url).query(query).send().await
    }

    pub async fn post_form<F: Serialize + ?Sized>(
        &self,
        url: impl IntoUrl,
        form: &F,
        headers: HeaderMap,
    ) -> Result<Response, reqwest::Error> {
        self.client.post(url).headers(headers).form(form).send().await
    }
}

/// Plain client for relaying media. Only the connect phase and each read are
/// bounded, a large video may legitimately take minutes to stream.
pub fn create_media_client(connect_timeout: Duration, read_timeout: Duration) -> Result<Client, reqwest::Error> {
    let builder = Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .user_agent(BROWSER_USER_AGENT);

    build_client(builder, None)
}

fn build_client(builder: reqwest::ClientBuilder, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    match proxy {
        Some(proxy_url) => {
            info!("Configuring client with proxy");
            builder.proxy(reqwest::Proxy::all(proxy_url)?).build()
        }
        None => builder.build(),
    }
}
