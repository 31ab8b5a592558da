//! Line protocol spoken between the search and the learning server.
//!
//! One request per line, answered by exactly one response line:
//!
//! ```text
//! > predict 0042
//! < ok 1.8734
//! > fit
//! < ok {"keys":["0042"],"feature_shape":[1,64,3],"property_shape":[1,1],"loss":0.31}
//! > add 9999
//! < err Missing data file: run/feature/point/9999.npy
//! ```
use crate::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Time,
    Predict(String),
    PredictPossible(String),
    Add(String),
    Fit,
    Save(PathBuf),
    Len,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(String),
    Err(String),
}

fn argument(verb: &str, rest: Option<&str>) -> Result<String, Error> {
    match rest.map(str::trim) {
        Some(arg) if !arg.is_empty() && !arg.contains(char::is_whitespace) => Ok(arg.to_string()),
        _ => Err(Error::Protocol(format!("'{verb}' takes exactly one argument"))),
    }
}

fn no_argument(verb: &str, rest: Option<&str>) -> Result<(), Error> {
    match rest.map(str::trim) {
        None | Some("") => Ok(()),
        Some(_) => Err(Error::Protocol(format!("'{verb}' takes no argument"))),
    }
}

impl FromStr for Request {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Error> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (line, None),
        };
        let request = match verb.to_ascii_lowercase().as_str() {
            "time" => no_argument(verb, rest).map(|_| Request::Time)?,
            "fit" => no_argument(verb, rest).map(|_| Request::Fit)?,
            "len" => no_argument(verb, rest).map(|_| Request::Len)?,
            "shutdown" => no_argument(verb, rest).map(|_| Request::Shutdown)?,
            "predict" => Request::Predict(argument(verb, rest)?),
            "predict-possible" => Request::PredictPossible(argument(verb, rest)?),
            "add" => Request::Add(argument(verb, rest)?),
            "save" => Request::Save(PathBuf::from(argument(verb, rest)?)),
            "" => return Err(Error::Protocol("empty request".to_string())),
            other => return Err(Error::Protocol(format!("unknown request '{other}'"))),
        };
        Ok(request)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Time => write!(f, "time"),
            Request::Predict(linker) => write!(f, "predict {linker}"),
            Request::PredictPossible(linker) => write!(f, "predict-possible {linker}"),
            Request::Add(linker) => write!(f, "add {linker}"),
            Request::Fit => write!(f, "fit"),
            Request::Save(path) => write!(f, "save {}", path.display()),
            Request::Len => write!(f, "len"),
            Request::Shutdown => write!(f, "shutdown"),
        }
    }
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    /// Payload of an `ok` response; an `err` response becomes
    /// [`Error::Remote`].
    pub fn into_result(self) -> Result<String, Error> {
        match self {
            Response::Ok(payload) => Ok(payload),
            Response::Err(message) => Err(Error::Remote(message)),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // responses are single lines
        let (tag, body) = match self {
            Response::Ok(payload) => ("ok", payload),
            Response::Err(message) => ("err", message),
        };
        let body = body.replace(['\r', '\n'], " ");
        if body.is_empty() {
            write!(f, "{tag}")
        } else {
            write!(f, "{tag} {body}")
        }
    }
}

impl FromStr for Response {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Error> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (tag, body) = line.split_once(' ').unwrap_or((line, ""));
        match tag {
            "ok" => Ok(Response::Ok(body.to_string())),
            "err" => Ok(Response::Err(body.to_string())),
            _ => Err(Error::Protocol(format!("unexpected response '{line}'"))),
        }
    }
}
