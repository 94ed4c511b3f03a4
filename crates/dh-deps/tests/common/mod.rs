//! Shared fixtures: an in-process artifact repository and archive builders.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use flate2::write::GzEncoder;
use flate2::Compression;
use tiny_http::{Response, Server, StatusCode};

/// Serves a fixed set of files over HTTP and records every requested path
pub struct TestServer {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    requests: Arc<Mutex<Vec<String>>>,
    port: u16,
}

impl TestServer {
    /// Serve `files` (keyed by URL path) with a `Content-Length` header
    pub fn start(files: HashMap<String, Vec<u8>>) -> Self {
        Self::start_with(files, true)
    }

    /// Serve `files`, optionally omitting `Content-Length` (chunked bodies)
    pub fn start_with(files: HashMap<String, Vec<u8>>, content_length: bool) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let thread_server = Arc::clone(&server);
        let thread_requests = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for request in thread_server.incoming_requests() {
                let url = request.url().to_string();
                thread_requests.lock().unwrap().push(url.clone());

                let _ = match files.get(&url) {
                    Some(body) if content_length => request.respond(Response::from_data(body.clone())),
                    Some(body) => request.respond(Response::new(
                        StatusCode(200),
                        Vec::new(),
                        Cursor::new(body.clone()),
                        None,
                        None,
                    )),
                    None => request.respond(Response::empty(StatusCode(404))),
                };
            }
        });

        Self {
            server,
            handle: Some(handle),
            requests,
            port,
        }
    }

    /// Base URL to hand to the pipeline
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/files", self.port)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Build a tar.gz, writing entry names raw so hostile paths survive
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        let bytes = name.as_bytes();
        header.as_old_mut().name[..bytes.len()].copy_from_slice(bytes);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

pub fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// Every file under `dir` with its contents, keyed by relative path
pub fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(dir, dir, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            files.insert(relative, fs::read(&path).unwrap());
        }
    }
}
