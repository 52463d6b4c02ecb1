use std::path::Path;

use hdf5::types::TypeDescriptor;
use hdf5::{Dataset, File};
use ndarray::aview0;
use tracing::debug;

use super::{Group, Value};
use crate::error::FileError;

/// Write a document to a new HDF5 file, truncating any existing file at `path`.
///
/// Groups become HDF5 groups, integers and floats become scalar datasets and arrays become
/// datasets of the same shape. The file handle is closed when this returns, also on failure.
pub fn write<P: AsRef<Path>>(path: P, document: &Group) -> Result<(), FileError> {
    let file = File::create(path.as_ref())
        .map_err(|err| FileError::Open(path.as_ref().to_owned(), err))?;

    write_group(&file, document)?;

    debug!(path = %path.as_ref().display(), entries = document.len(), "wrote interchange file");

    Ok(())
}

/// Read a complete HDF5 file into a document.
///
/// Integer and boolean datasets are read as [Value::Int] when scalar, integer and boolean arrays
/// are widened to floating point arrays.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Group, FileError> {
    let file = File::open(path.as_ref())
        .map_err(|err| FileError::Open(path.as_ref().to_owned(), err))?;

    let document = read_group(&file, "")?;

    debug!(path = %path.as_ref().display(), entries = document.len(), "read interchange file");

    Ok(document)
}

fn write_group(target: &hdf5::Group, group: &Group) -> Result<(), FileError> {
    for (name, value) in group.iter() {
        let path = group.child_path(name);
        let builder = target.new_dataset_builder();

        let written = match value {
            Value::Int(value) => builder.with_data(aview0(value)).create(name.as_str()),
            Value::Float(value) => builder.with_data(aview0(value)).create(name.as_str()),
            Value::Array(array) => builder.with_data(array).create(name.as_str()),
            Value::Group(child) => {
                let h5group = target
                    .create_group(name)
                    .map_err(|err| FileError::Write(path.clone(), err))?;
                write_group(&h5group, child)?;
                continue;
            }
        };

        written.map_err(|err| FileError::Write(path, err))?;
    }

    Ok(())
}

fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}/{name}")
    }
}

fn read_group(source: &hdf5::Group, path: &str) -> Result<Group, FileError> {
    let mut group = Group::new();

    let children = source
        .groups()
        .map_err(|err| FileError::Read(path.to_owned(), err))?;

    for child in children {
        let full_name = child.name();
        let name = basename(&full_name);
        let value = read_group(&child, &join(path, name))?;
        group.insert(name, value);
    }

    let datasets = source
        .datasets()
        .map_err(|err| FileError::Read(path.to_owned(), err))?;

    for dataset in datasets {
        let full_name = dataset.name();
        let name = basename(&full_name);
        let value = read_dataset(&dataset, &join(path, name))?;
        group.insert(name, value);
    }

    Ok(group)
}

fn read_dataset(dataset: &Dataset, path: &str) -> Result<Value, FileError> {
    let read_err = |err| FileError::Read(path.to_owned(), err);

    let descriptor = dataset
        .dtype()
        .and_then(|dtype| dtype.to_descriptor())
        .map_err(read_err)?;

    match descriptor {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            if dataset.is_scalar() {
                Ok(Value::Int(dataset.read_scalar::<i64>().map_err(read_err)?))
            } else {
                let array = dataset.read_dyn::<i64>().map_err(read_err)?;
                Ok(Value::Array(array.mapv(|v| v as f64)))
            }
        }
        TypeDescriptor::Boolean => {
            if dataset.is_scalar() {
                let flag = dataset.read_scalar::<bool>().map_err(read_err)?;
                Ok(Value::Int(i64::from(flag)))
            } else {
                let array = dataset.read_dyn::<bool>().map_err(read_err)?;
                Ok(Value::Array(array.mapv(|flag| f64::from(u8::from(flag)))))
            }
        }
        TypeDescriptor::Float(_) => {
            if dataset.is_scalar() {
                Ok(Value::Float(dataset.read_scalar::<f64>().map_err(read_err)?))
            } else {
                Ok(Value::Array(dataset.read_dyn::<f64>().map_err(read_err)?))
            }
        }
        _ => Err(FileError::UnsupportedType(path.to_owned())),
    }
}
