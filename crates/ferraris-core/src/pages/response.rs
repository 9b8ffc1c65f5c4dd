use alloc::string::String;
use core::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Unauthorized,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Unauthorized => 401,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Unauthorized => "Unauthorized",
        }
    }
}

/// A complete HTTP/1.0 reply: status line, headers and an HTML body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: String,
}

impl Response {
    pub fn new(status: Status, body: String) -> Self {
        Self { status, body }
    }

    /// Write the status line and headers, including the blank separator line
    pub fn write_head<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(
            out,
            "HTTP/1.0 {} {}\r\nContent-Type: text/html\r\n",
            self.status.code(),
            self.status.reason()
        )?;
        // Pages change every tick, browsers must not cache them
        if self.status == Status::Ok {
            out.write_str("Pragma: no-cache\r\n")?;
        }
        out.write_str("\r\n")
    }

    /// Full wire representation
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 80);
        // Writing into a String can't fail
        let _ = self.write_head(&mut out);
        out.push_str(&self.body);
        out
    }
}
