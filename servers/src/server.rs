use crate::rpc::RpcHandler;
use http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use http::{HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1::Builder;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use log::{error, info, warn};
use std::io::{Error, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::select;

pub const MAX_BODY_SIZE: usize = 64 * 1024;

pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

pub struct HistoryServer<T, H> {
    pub socket_address: SocketAddr,
    pub state: Arc<T>,
    pub handler: Arc<H>,
}
impl<T, H> HistoryServer<T, H>
where
    T: Send + Sync + 'static,
    H: RpcHandler<T> + Send + Sync + 'static,
{
    pub fn new(config: &HttpServerConfig, state: Arc<T>, handler: Arc<H>) -> Result<Self, Error> {
        Ok(HistoryServer {
            socket_address: Self::init_socket(config)?,
            state,
            handler,
        })
    }

    pub fn init_socket(config: &HttpServerConfig) -> Result<SocketAddr, Error> {
        let ip = if config.host == "localhost" {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            IpAddr::from_str(&config.host).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("Failed to parse Host: {e:?}"),
                )
            })?
        };
        Ok(SocketAddr::new(ip, config.port))
    }

    pub async fn run(&self, run: Arc<AtomicBool>) -> Result<(), Error> {
        let listener = TcpListener::bind(self.socket_address).await?;
        info!("Listening on {}", listener.local_addr()?);
        self.serve(listener, run).await
    }

    /// Accepts connections from `listener` until `run` is cleared.
    pub async fn serve(&self, listener: TcpListener, run: Arc<AtomicBool>) -> Result<(), Error> {
        let mut http = Builder::new();
        http.keep_alive(true);
        while run.load(Ordering::Relaxed) {
            select!(
                res = listener.accept() => {
                    match res {
                        Ok((stream, _)) => {
                            let state = self.state.clone();
                            let handler = self.handler.clone();
                            let service = service_fn(move |req| {
                                let state = state.clone();
                                let handler = handler.clone();
                                async move { connection_handler(req, handler, state).await }
                            });
                            let connection = http.serve_connection(TokioIo::new(stream), service);
                            tokio::spawn(async move {
                                if let Err(e) = connection.await {
                                    error!("Error serving connection: {e:?}");
                                }
                            });
                        }
                        Err(e) => {
                            error!("Error accepting connection: {e:?}");
                        }
                    }
                },
                () = tokio::time::sleep(Duration::from_millis(10)) => {}
            );
        }
        Ok(())
    }
}

async fn connection_handler<T, H>(
    req: Request<Incoming>,
    handler: Arc<H>,
    state: Arc<T>,
) -> Result<Response<Full<Bytes>>, Error>
where
    T: Send + Sync + 'static,
    H: RpcHandler<T> + Send + Sync + 'static,
{
    let (parts, body) = req.into_parts();
    match Limited::new(body, MAX_BODY_SIZE).collect().await {
        Ok(collected) => {
            handler
                .handle(Request::from_parts(parts, collected.to_bytes()), state)
                .await
        }
        Err(e) => {
            warn!("Rejected body for {} {}: {e}", parts.method, parts.uri.path());
            let mut response = Response::new(Full::new(Bytes::from("Invalid request body")));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            response
                .headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            Ok(response)
        }
    }
}
