use thiserror_no_std::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    /// Any other token in the method position
    Other,
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            _ => Self::Other,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("empty request")]
    Empty,
    #[error("request line is not valid UTF-8")]
    NotUtf8,
    #[error("request line has no target")]
    MissingTarget,
}

/// The parts of an HTTP request line the router looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: Method,
    /// Target path with any query string removed
    pub path: &'a str,
}

impl<'a> Request<'a> {
    /// Parse the request line at the start of `bytes`
    ///
    /// Headers and body are ignored; only the first line is decoded.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, RequestError> {
        let line_end = bytes
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(bytes.len());
        let line = core::str::from_utf8(&bytes[..line_end]).map_err(|_| RequestError::NotUtf8)?;

        let mut parts = line.split_ascii_whitespace();
        let method = parts.next().map(Method::parse).ok_or(RequestError::Empty)?;
        let target = parts.next().ok_or(RequestError::MissingTarget)?;
        let path = target.split('?').next().unwrap_or(target);

        Ok(Self { method, path })
    }
}
