use std::{
  fs,
  io,
  path::{
    Path,
    PathBuf,
  },
};

use anyhow::Context;

pub fn read(path: impl AsRef<Path>) -> anyhow::Result<Option<String>> {
  let path = path.as_ref();

  match fs::read_to_string(path) {
    Ok(string) => Ok(Some(string)),

    Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),

    Err(error) => {
      Err(error)
        .context(format!("failed to read '{path}'", path = path.display()))
    },
  }
}

/// Writes `contents`, creating missing parent directories first.
pub fn write(path: impl AsRef<Path>, contents: &str) -> anyhow::Result<()> {
  let path = path.as_ref();

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).with_context(|| {
      format!(
        "failed to create directory '{parent}'",
        parent = parent.display(),
      )
    })?;
  }

  fs::write(path, contents)
    .with_context(|| format!("failed to write '{path}'", path = path.display()))
}

/// Removes a file. Returns `false` if there was nothing to remove.
pub fn remove(path: impl AsRef<Path>) -> anyhow::Result<bool> {
  let path = path.as_ref();

  match fs::remove_file(path) {
    Ok(()) => Ok(true),

    Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),

    Err(error) => {
      Err(error)
        .context(format!("failed to remove '{path}'", path = path.display()))
    },
  }
}

/// Files directly inside `directory`, sorted. A missing directory is empty.
pub fn files(directory: impl AsRef<Path>) -> anyhow::Result<Vec<PathBuf>> {
  let directory = directory.as_ref();

  let entries = match fs::read_dir(directory) {
    Ok(entries) => entries,

    Err(error) if error.kind() == io::ErrorKind::NotFound => {
      return Ok(Vec::new());
    },

    Err(error) => {
      return Err(error).context(format!(
        "failed to read directory '{directory}'",
        directory = directory.display(),
      ));
    },
  };

  let mut files = Vec::new();

  for entry in entries {
    let path = entry
      .with_context(|| {
        format!(
          "failed to read directory '{directory}'",
          directory = directory.display(),
        )
      })?
      .path();

    if path.is_file() {
      files.push(path);
    }
  }

  files.sort();
  Ok(files)
}

#[cfg(test)]
mod tests {
  use std::env;

  use super::*;

  #[test]
  fn missing_file_reads_as_none() {
    let path = env::temp_dir().join("powertuner-fs-test-missing");

    assert_eq!(read(path).unwrap(), None);
  }

  #[test]
  fn write_creates_parents() {
    let directory = env::temp_dir()
      .join(format!("powertuner-fs-test-{pid}", pid = std::process::id()));
    let path = directory.join("nested").join("file.json");

    write(&path, "{}").unwrap();
    assert_eq!(read(&path).unwrap().as_deref(), Some("{}"));

    fs::remove_dir_all(directory).unwrap();
  }

  #[test]
  fn files_are_listed_and_removed() {
    let directory = env::temp_dir()
      .join(format!("powertuner-fs-files-{pid}", pid = std::process::id()));

    assert!(files(&directory).unwrap().is_empty());

    write(directory.join("b.json"), "{}").unwrap();
    write(directory.join("a.json"), "{}").unwrap();
    write(directory.join("nested").join("c.json"), "{}").unwrap();

    assert_eq!(files(&directory).unwrap(), [
      directory.join("a.json"),
      directory.join("b.json"),
    ]);

    assert!(remove(directory.join("a.json")).unwrap());
    assert!(!remove(directory.join("a.json")).unwrap());

    fs::remove_dir_all(directory).unwrap();
  }
}
