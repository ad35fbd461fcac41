/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use std::fs::{self,File};
use std::io::{self,Read,Write,ErrorKind};
use std::path::{Path,PathBuf};
use serde::{Serialize,de::DeserializeOwned};
use tempfile::NamedTempFile;

use crate::io_error;
use crate::errors::Result;

type IoResult<T> = std::result::Result<T,std::io::Error>;

/// check if dir pathname exists and is writable, try to create dir otherwise
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        let md = fs::metadata(&path)?;
        if md.permissions().readonly() {
            Err(io_error!( ErrorKind::PermissionDenied, "dir {:?} not writable", &path))
        } else {
            Ok(())
        }
    } else {
        fs::create_dir_all(path)
    }
}

pub fn filepath_contents <P: AsRef<Path>> (path: &P) -> IoResult<Vec<u8>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut contents: Vec<u8> = Vec::with_capacity(len as usize);
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// number of regular files in dir whose name has the given extension
pub fn count_files_with_extension (dir: impl AsRef<Path>, ext: &str)->usize {
    match fs::read_dir( dir.as_ref()) {
        Ok(entries) => entries
            .filter_map( |e| e.ok())
            .filter( |e| e.path().is_file() && e.path().extension().and_then(|x| x.to_str()) == Some(ext))
            .count(),
        Err(_) => 0
    }
}

/// write contents into a temp file within the same dir and then move it into place, so that readers never
/// see partially written files
pub fn write_atomic (path: impl AsRef<Path>, contents: &[u8]) -> IoResult<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new(".")
    };

    let mut file = NamedTempFile::new_in( dir)?; // don't use path yet as that would expose partial files
    file.write_all( contents)?;
    file.as_file().sync_all()?;
    file.persist( path).map_err( |e| e.error)?;
    Ok(())
}

pub fn write_json_atomic<T: Serialize> (path: impl AsRef<Path>, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec( value)?;
    Ok( write_atomic( path, &bytes)? )
}

/// read and parse a JSON file. Returns `Ok(None)` if the file does not exist
pub fn read_json_if_exists<T: DeserializeOwned> (path: impl AsRef<Path>) -> Result<Option<T>> {
    let path = path.as_ref();
    if !path.is_file() { return Ok(None) }

    let bytes = filepath_contents( &path)?;
    Ok( Some( serde_json::from_slice( &bytes)? ))
}

/// turn an arbitrary name into something we can use as part of a filename (lowercase alphanumerics, '_' otherwise)
pub fn file_slug (name: &str)->String {
    let slug: String = name.trim().chars()
        .map( |c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if slug.is_empty() { "default".to_string() } else { slug }
}
