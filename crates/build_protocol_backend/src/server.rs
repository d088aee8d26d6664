use std::{net::SocketAddr, sync::Arc};

use build_protocol_types::Method;
use jsonrpc_core::{Error, ErrorCode, IoHandler, Params};
use miette::{IntoDiagnostic, JSONReportHandler};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    protocol::ProtocolInstantiator,
    session::{DispatchError, Session},
};

/// A JSONRPC server that can be used to communicate with a client.
///
/// A server serves exactly one session.
pub struct Server<T: ProtocolInstantiator> {
    instantiator: T,
}

impl<T: ProtocolInstantiator> Server<T> {
    pub fn new(instantiator: T) -> Self {
        Self { instantiator }
    }

    /// Run the server, communicating over stdin/stdout.
    pub async fn run(self) -> miette::Result<()> {
        let io = self.io_handler();
        jsonrpc_stdio_server::ServerBuilder::new(io).build().await;
        Ok(())
    }

    /// Run the server, communicating over HTTP.
    pub fn run_over_http(self, port: u16) -> miette::Result<()> {
        let io = self.io_handler();
        let address = SocketAddr::from(([127, 0, 0, 1], port));
        tracing::info!("listening on http://{address}");
        jsonrpc_http_server::ServerBuilder::new(io)
            .start_http(&address)
            .into_diagnostic()?
            .wait();
        Ok(())
    }

    /// Builds the handler that binds every method of the protocol to the
    /// session of this server. Useful to plug the server into a custom
    /// transport.
    pub fn io_handler(self) -> IoHandler {
        let mut io = IoHandler::new();
        let session = Arc::new(Mutex::new(Session::new(self.instantiator)));

        for method in Method::ALL {
            let session = session.clone();
            io.add_method(method.name(), move |params: Params| {
                let session = session.clone();
                async move {
                    let params = params_to_value(params);
                    let mut session = session.lock().await;
                    session
                        .handle(method.name(), &params)
                        .await
                        .map_err(convert_dispatch_error)
                }
            });
        }

        io
    }
}

/// Positional parameters are passed along as an array so that the message
/// catalog can reject them with a proper diagnostic.
fn params_to_value(params: Params) -> Value {
    match params {
        Params::None => Value::Null,
        Params::Array(values) => Value::Array(values),
        Params::Map(map) => Value::Object(map),
    }
}

fn convert_dispatch_error(err: DispatchError) -> Error {
    match err {
        DispatchError::UnknownMethod(_) => Error::method_not_found(),
        DispatchError::Validation(err) => Error {
            code: ErrorCode::InvalidParams,
            message: err.to_string(),
            data: serde_json::to_value(&err).ok(),
        },
        DispatchError::Sequencing(err) => Error {
            code: ErrorCode::InvalidRequest,
            message: err.to_string(),
            data: None,
        },
        DispatchError::Backend(err) => convert_error(err),
        err @ DispatchError::Serialize(..) => Error {
            code: ErrorCode::InternalError,
            message: err.to_string(),
            data: None,
        },
    }
}

fn convert_error(err: miette::Report) -> Error {
    let rendered = JSONReportHandler::new();
    let mut json_str = String::new();
    let data = match rendered.render_report(&mut json_str, err.as_ref()) {
        Ok(()) => serde_json::from_str(&json_str).ok(),
        Err(_) => None,
    };
    Error {
        code: ErrorCode::ServerError(-32000),
        message: err.to_string(),
        data,
    }
}
