use std::io;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::{BoxError, Dial, DialError, Target};

/// Dials the first reachable address of an address-list target.
///
/// Addresses are tried in order within one attempt. An address that cannot
/// be parsed as `host:port` fails the attempt permanently; refused or
/// unreachable addresses fail it transiently.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpDialer;

#[async_trait::async_trait]
impl Dial for TcpDialer {
    type Connection = TcpStream;

    async fn dial(&self, target: &Target) -> Result<TcpStream, DialError<TcpStream>> {
        let addresses = target.address_list().ok_or_else(|| {
            DialError::<TcpStream>::permanent(
                "tcp targets need an address list, not a connection string",
            )
        })?;

        let mut last_error: Option<io::Error> = None;
        for address in addresses {
            match TcpStream::connect(address.as_str()).await {
                Ok(stream) => return Ok(stream),
                Err(err) if err.kind() == io::ErrorKind::InvalidInput => {
                    return Err(DialError::permanent(format!("{address}: {err}")));
                }
                Err(err) => last_error = Some(err),
            }
        }

        Err(match last_error {
            Some(err) => DialError::transient(err),
            None => DialError::permanent("address list is empty"),
        })
    }

    async fn disconnect(&self, mut stream: TcpStream) -> Result<(), BoxError> {
        stream.shutdown().await?;
        Ok(())
    }
}
