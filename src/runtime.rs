pub mod io {
    #[cfg(feature = "runtime-tokio")]
    pub(crate) use tokio::io::{AsyncBufRead as BufRead, AsyncWrite as Write, BufStream};
}

pub mod time {
    #[cfg(feature = "runtime-tokio")]
    pub(crate) use tokio::time::timeout;
}

pub mod net {
    #[cfg(feature = "runtime-tokio")]
    pub(crate) use tokio::net::TcpStream;
}
