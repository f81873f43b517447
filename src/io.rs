//! Line transport abstraction.
//!
//! The command interface talks to the serial link through two small traits:
//! [`LineSource`] hands over whole lines, [`LineSink`] sends one reply line.
//! Transports that only move characters implement [`CharIo`] and get line
//! framing from [`CharLineSource`] and [`CharLineSink`].

use crate::config::MAX_COMMAND_LEN;
use crate::error::{MonitorError, Result};
use core::fmt::Debug;

/// Platform-agnostic character I/O trait.
///
/// `get_char` must not block; output may be buffered by the implementation
/// but must not block indefinitely.
pub trait CharIo {
    /// Platform-specific error type
    type Error: Debug;

    /// Non-blocking character read.
    ///
    /// Returns:
    /// - `Ok(Some(char))` if character available
    /// - `Ok(None)` if no character available
    /// - `Err(Self::Error)` on I/O error
    fn get_char(&mut self) -> core::result::Result<Option<char>, Self::Error>;

    /// Write character to output buffer.
    fn put_char(&mut self, c: char) -> core::result::Result<(), Self::Error>;

    /// Write string to output buffer.
    ///
    /// Default implementation uses `put_char()` repeatedly.
    fn write_str(&mut self, s: &str) -> core::result::Result<(), Self::Error> {
        for c in s.chars() {
            self.put_char(c)?;
        }
        Ok(())
    }
}

/// Source of framed command lines.
pub trait LineSource {
    /// Receive the next line into `line`.
    ///
    /// Returns `Ok(n)` with `n > 0` for a line, `Ok(0)` when nothing (or an
    /// empty line) arrived. Overflow and transport faults are errors.
    fn receive_line(&mut self, line: &mut heapless::String<MAX_COMMAND_LEN>) -> Result<usize>;
}

/// Destination for reply lines.
pub trait LineSink {
    /// Send one line; the implementation appends the line terminator.
    fn send_line(&mut self, line: &str) -> Result<()>;
}

fn transport_error<E: Debug>(err: E) -> MonitorError {
    MonitorError::Transport(format!("{:?}", err))
}

// ============================================================================
// Line framing
// ============================================================================

/// Result of feeding one character to a [`LineFramer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Nothing to do
    None,

    /// Character accepted; echo it
    Echo(char),

    /// Last character removed
    Erase,

    /// Line complete (possibly empty)
    Line,

    /// Line complete but longer than the buffer; its content was dropped
    Overflow,
}

/// Character-to-line state machine.
///
/// CR, LF and CRLF all end a line. Backspace and DEL erase. Other control
/// characters are ignored. Once a line outgrows the buffer the rest of it is
/// swallowed and the terminator reports [`FrameEvent::Overflow`].
#[derive(Debug, Default)]
pub struct LineFramer<const N: usize> {
    buffer: heapless::String<N>,
    discarding: bool,
    after_cr: bool,
}

impl<const N: usize> LineFramer<N> {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self {
            buffer: heapless::String::new(),
            discarding: false,
            after_cr: false,
        }
    }

    /// Feed one character.
    pub fn process_char(&mut self, c: char) -> FrameEvent {
        let after_cr = core::mem::replace(&mut self.after_cr, c == '\r');

        match c {
            // LF of a CRLF pair
            '\n' if after_cr => FrameEvent::None,

            '\r' | '\n' => {
                if core::mem::take(&mut self.discarding) {
                    self.buffer.clear();
                    FrameEvent::Overflow
                } else {
                    FrameEvent::Line
                }
            }

            _ if self.discarding => FrameEvent::None,

            '\x08' | '\x7f' => match self.buffer.pop() {
                Some(_) => FrameEvent::Erase,
                None => FrameEvent::None,
            },

            c if c.is_control() => FrameEvent::None,

            c => match self.buffer.push(c) {
                Ok(()) => FrameEvent::Echo(c),
                Err(_) => {
                    self.discarding = true;
                    self.buffer.clear();
                    FrameEvent::None
                }
            },
        }
    }

    /// Partial line collected so far.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Move the completed line into `out` and reset; returns its length.
    pub fn take_line(&mut self, out: &mut heapless::String<N>) -> usize {
        out.clear();
        core::mem::swap(out, &mut self.buffer);
        out.len()
    }
}

// ============================================================================
// CharIo adapters
// ============================================================================

/// [`LineSource`] over a character transport, with echo.
#[derive(Debug)]
pub struct CharLineSource<IO: CharIo> {
    io: IO,
    framer: LineFramer<MAX_COMMAND_LEN>,
}

impl<IO: CharIo> CharLineSource<IO> {
    /// Wrap a character transport.
    pub fn new(io: IO) -> Self {
        Self {
            io,
            framer: LineFramer::new(),
        }
    }

    /// Get reference to the I/O interface.
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Get mutable reference to the I/O interface.
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }
}

impl<IO: CharIo> LineSource for CharLineSource<IO> {
    fn receive_line(&mut self, line: &mut heapless::String<MAX_COMMAND_LEN>) -> Result<usize> {
        while let Some(c) = self.io.get_char().map_err(transport_error)? {
            match self.framer.process_char(c) {
                FrameEvent::None => {}
                FrameEvent::Echo(c) => self.io.put_char(c).map_err(transport_error)?,
                FrameEvent::Erase => self.io.write_str("\x08 \x08").map_err(transport_error)?,
                FrameEvent::Line => {
                    self.io.write_str("\r\n").map_err(transport_error)?;
                    return Ok(self.framer.take_line(line));
                }
                FrameEvent::Overflow => {
                    self.io.write_str("\r\n").map_err(transport_error)?;
                    line.clear();
                    return Err(MonitorError::LineOverflow);
                }
            }
        }
        Ok(0)
    }
}

/// [`LineSink`] over a character transport; terminates lines with CRLF.
#[derive(Debug)]
pub struct CharLineSink<IO: CharIo> {
    io: IO,
}

impl<IO: CharIo> CharLineSink<IO> {
    /// Wrap a character transport.
    pub fn new(io: IO) -> Self {
        Self { io }
    }

    /// Get reference to the I/O interface.
    pub fn io(&self) -> &IO {
        &self.io
    }
}

impl<IO: CharIo> LineSink for CharLineSink<IO> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        self.io.write_str(line).map_err(transport_error)?;
        self.io.write_str("\r\n").map_err(transport_error)
    }
}
