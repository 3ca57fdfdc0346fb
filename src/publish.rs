use crate::error::FileWriteError;
use crate::model::PostResult;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const POST_FILE_NAME: &str = "linkedin_post.txt";

/// Writes `post_text` verbatim to `<output_dir>/linkedin_post.txt`.
pub fn save_post(post: &PostResult, output_dir: &Path) -> Result<PathBuf, FileWriteError> {
    let path = output_dir.join(POST_FILE_NAME);
    let write = || -> std::io::Result<()> {
        std::fs::create_dir_all(output_dir)?;
        let mut w = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)?,
        );
        w.write_all(post.post_text.as_bytes())?;
        w.flush()
    };
    write().map_err(|source| FileWriteError {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Echoes the post and stands in for the LinkedIn call. Never touches the
/// network.
pub fn announce(
    out: &mut impl Write,
    post: &PostResult,
    saved_to: Option<&Path>,
) -> std::io::Result<()> {
    writeln!(out, "\n--- Generated LinkedIn Post ---")?;
    writeln!(out, "{}", post.post_text)?;
    if let Some(path) = saved_to {
        writeln!(out, "\nPost saved to {}", path.display())?;
    }
    writeln!(out, "\n--- Mocking LinkedIn API Call ---")?;
    writeln!(out, "Image to post: {}", post.image_label())?;
    writeln!(out, "Post would be published to LinkedIn here.")?;
    Ok(())
}
