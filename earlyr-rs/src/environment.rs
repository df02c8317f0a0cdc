//! Run environment for estimation jobs driven by a JSON description on stdin.
//!
//! The description has the shape
//!
//! ```json
//! {
//!   "input": { "seed": 42, "replicate": 0, "...": "model inputs" },
//!   "model": { "files": { "config_file": "/path/to/estimation.toml" } },
//!   "output": { "spec": "filesystem", "dir": "/path/to/output" }
//! }
//! ```
//!
//! `seed` and `replicate` are lifted out of `input`; everything else is left
//! for the job to deserialize into its own input type. Outputs go to the
//! configured directory, or to stdout when there is none.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use log::debug;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{Error, Result};

pub struct Environment<I = ()> {
    input_json: serde_json::Map<String, Value>,
    pub input: Option<I>,
    pub seed: u64,
    pub replicate: u64,
    pub files: HashMap<String, PathBuf>,
    output: Value,
}

impl Environment {
    pub fn from_json(data: Value) -> Self {
        let mut input_json = data
            .get("input")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let seed = input_json
            .remove("seed")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let replicate = input_json
            .remove("replicate")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let files = data
            .get("model")
            .and_then(|m| m.get("files"))
            .and_then(|f| f.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), PathBuf::from(s))))
                    .collect()
            })
            .unwrap_or_default();

        let output = data.get("output").cloned().unwrap_or(Value::Null);

        Self {
            input_json,
            input: None,
            seed,
            replicate,
            files,
            output,
        }
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        if raw.trim().is_empty() {
            return Err(Error::invalid("input", "no run description was provided"));
        }
        let data: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_json(data))
    }

    pub fn from_stdin() -> Result<Self> {
        Self::from_reader(io::stdin().lock())
    }

    pub fn with_input_type<I: DeserializeOwned>(self) -> Result<Environment<I>> {
        let input_value = Value::Object(self.input_json.clone());
        let input = serde_json::from_value(input_value)?;
        Ok(Environment {
            input_json: self.input_json,
            input: Some(input),
            seed: self.seed,
            replicate: self.replicate,
            files: self.files,
            output: self.output,
        })
    }
}

impl<I: DeserializeOwned> Environment<I> {
    pub fn load() -> Result<Self> {
        Environment::from_stdin()?.with_input_type::<I>()
    }
}

impl<I> Environment<I> {
    pub fn input_json(&self) -> &serde_json::Map<String, Value> {
        &self.input_json
    }

    /// The typed input, present once [`Environment::with_input_type`] has run.
    pub fn input(&self) -> Result<&I> {
        self.input
            .as_ref()
            .ok_or_else(|| Error::invalid("input", "input has not been deserialized"))
    }

    pub fn file(&self, name: &str) -> Option<&PathBuf> {
        self.files.get(name)
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        let output = &self.output;

        if output.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            return output.get("dir").and_then(|v| v.as_str()).map(PathBuf::from);
        }

        // Profiled output: prefer the `default` profile
        let profile = output
            .get("profile")
            .and_then(|v| v.as_object())
            .and_then(|profiles| profiles.get("default").or_else(|| profiles.values().next()))?;
        if profile.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            return profile.get("dir").and_then(|v| v.as_str()).map(PathBuf::from);
        }
        None
    }

    fn open(&self, filename: &str) -> Result<Box<dyn Write>> {
        match self.output_dir() {
            Some(dir) => {
                fs::create_dir_all(&dir)?;
                let path = dir.join(filename);
                debug!("Writing {}", path.display());
                Ok(Box::new(io::BufWriter::new(fs::File::create(path)?)))
            }
            None => Ok(Box::new(io::stdout().lock())),
        }
    }

    pub fn write(&self, filename: &str, data: &[u8]) -> Result<()> {
        let mut out = self.open(filename)?;
        out.write_all(data)?;
        out.flush()?;
        Ok(())
    }

    pub fn write_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(value)?;
        data.push(b'\n');
        self.write(filename, &data)
    }

    /// Writes one CSV row per record; headers come from the record's fields.
    pub fn write_csv<T: Serialize>(&self, filename: &str, records: &[T]) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(self.open(filename)?);
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
