//! Client talking to an in-process peer
//!
//! The peer answers `getWells` and rejects everything else, so the output
//! shows a success, a protocol error and the close handshake.
//!
//! ```text
//! RUST_LOG=debug cargo run -p logiq-client --example loopback
//! ```

use logiq_client::{ClientConfig, EventDispatcher, MemoryConnection, RpcClient};
use logiq_json_rpc::{ErrorType, Request, Response, params};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (connection, mut peer) = MemoryConnection::pair();
    let client = RpcClient::new(Box::new(connection), ClientConfig::default())?;

    let (answered, mut answers) = mpsc::unbounded_channel();
    let dispatcher = EventDispatcher::new();
    dispatcher.on_open(|| println!("opened"));
    dispatcher.on_response(move |response| {
        println!("{response}");
        let _ = answered.send(response.id());
    });
    dispatcher.on_close(|code, reason, remote| {
        println!("closed: {code} {reason} (remote: {remote})");
    });
    let events = client.start(dispatcher).await?;

    let server = tokio::spawn(async move {
        while let Some(text) = peer.recv_text().await {
            let response = match Request::decode(&text) {
                Ok(request) if request.method() == "getWells" => {
                    Response::success(vec!["31/2-1", "31/2-2"], request.id())
                }
                Ok(request) => {
                    Response::failure(ErrorType::MethodNotFound, None, Some(request.id()))
                }
                Err(error) => Response::from_error(error.to_error_object(), None),
            };
            if peer.deliver(response.encode()).is_err() {
                break;
            }
        }
    });

    client.open().await?;
    client.call("getWells", params!["Troll"]).await?;
    client.call("getLogs", params!["31/2-1", 0, 2500.0]).await?;
    for _ in 0..2 {
        answers.recv().await;
    }
    client.close().await?;

    println!("{:?}", client.statistics());
    drop(client);
    server.await?;
    events.await?;
    Ok(())
}
