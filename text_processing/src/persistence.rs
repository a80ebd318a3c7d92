//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

//! Shared helpers for the binary and json files written by this crate.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use camino::Utf8Path;
use camino_tempfile::NamedUtf8TempFile;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::error::{PersistenceError, PersistenceErrorKind};

/// The version of the binary layout, bumped on incompatible changes.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    kind: String,
    version: u32,
    payload: T,
}

/// Writes to a temp file next to [path] and moves it into place afterwards,
/// a failing write never leaves a partial file behind.
pub(crate) fn write_atomically<F>(path: &Utf8Path, write: F) -> Result<(), PersistenceError>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<(), PersistenceErrorKind>
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let temp = NamedUtf8TempFile::new_in(parent).map_err(|err| PersistenceError::new(path, err))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer).map_err(|err| PersistenceError::new(path, err))?;
        writer.flush().map_err(|err| PersistenceError::new(path, err))?;
    }
    temp.persist(path).map_err(|err| PersistenceError::new(path, err.error))?;
    Ok(())
}

pub(crate) fn save_binary<T: Serialize>(path: &Utf8Path, kind: &str, payload: &T) -> Result<(), PersistenceError> {
    write_atomically(path, |writer| {
        bincode::serialize_into(
            writer,
            &Envelope { kind: kind.to_string(), version: FORMAT_VERSION, payload }
        )?;
        Ok(())
    })
}

pub(crate) fn load_binary<T: DeserializeOwned>(path: &Utf8Path, kind: &str) -> Result<T, PersistenceError> {
    let reader = BufReader::new(File::open(path).map_err(|err| PersistenceError::new(path, err))?);
    let envelope: Envelope<T> = bincode::deserialize_from(reader)
        .map_err(|err| PersistenceError::new(path, err))?;
    if envelope.kind != kind {
        return Err(PersistenceError::corrupt(path, format!("Expected a {kind} but found a {}!", envelope.kind)))
    }
    if envelope.version != FORMAT_VERSION {
        return Err(PersistenceError::corrupt(path, format!("Unsupported format version {}!", envelope.version)))
    }
    Ok(envelope.payload)
}

pub(crate) fn save_json<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), PersistenceError> {
    write_atomically(path, |writer| {
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    })
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, PersistenceError> {
    let reader = BufReader::new(File::open(path).map_err(|err| PersistenceError::new(path, err))?);
    serde_json::from_reader(reader).map_err(|err| PersistenceError::new(path, err))
}
