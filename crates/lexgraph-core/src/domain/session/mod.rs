//! Session source domain
//!
//! Interface to the chat sessions a graph is built from.

mod source;

pub use source::{
    SessionContent, SessionFile, SessionInfo, SessionMessage, SessionNote, SessionSource,
};
