//! Passwd lookups and user enumeration.

use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use libc::c_char;

/// The parts of a passwd entry quota reporting needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub uid: u32,
    pub dir: PathBuf,
}

unsafe fn to_user(pwd: &libc::passwd) -> User {
    let name = CStr::from_ptr(pwd.pw_name);
    let dir = OsStr::from_bytes(CStr::from_ptr(pwd.pw_dir).to_bytes());

    User {
        name: name.to_string_lossy().into_owned(),
        uid: pwd.pw_uid,
        dir: PathBuf::from(dir),
    }
}

fn not_found() -> io::Error {
    io::Error::from_raw_os_error(libc::ENOENT)
}

impl User {
    /// # Errors
    ///
    /// Returns an error if there is no such user or the lookup fails.
    pub fn by_name(name: &str) -> io::Result<Self> {
        let mut buf = [0 as c_char; 4096];
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let cname = CString::new(name).map_err(|_| not_found())?;

        let ret = unsafe {
            libc::getpwnam_r(
                cname.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if ret != 0 {
            return Err(io::Error::from_raw_os_error(ret));
        }

        if result.is_null() {
            return Err(not_found());
        }

        Ok(unsafe { to_user(&pwd) })
    }

    /// # Errors
    ///
    /// Returns an error if there is no such user or the lookup fails.
    pub fn by_uid(uid: u32) -> io::Result<Self> {
        let mut buf = [0 as c_char; 4096];
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let ret = unsafe {
            libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
        };

        if ret != 0 {
            return Err(io::Error::from_raw_os_error(ret));
        }

        if result.is_null() {
            return Err(not_found());
        }

        Ok(unsafe { to_user(&pwd) })
    }

    /// The user running this process.
    ///
    /// # Errors
    ///
    /// Returns an error if the real uid has no passwd entry.
    pub fn current() -> io::Result<Self> {
        Self::by_uid(unsafe { libc::getuid() })
    }

    /// Resolves a command line argument: all digits is a uid, anything
    /// else a login name, nothing the calling user.
    ///
    /// # Errors
    ///
    /// Returns an error if no such user exists.
    pub fn resolve(arg: Option<&str>) -> io::Result<Self> {
        match arg {
            None => Self::current(),
            Some(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                let uid = s.parse::<u32>().map_err(|_| not_found())?;
                Self::by_uid(uid)
            }
            Some(s) => Self::by_name(s),
        }
    }
}

/// Resolves a command line argument to a uid and, when the passwd
/// database knows it, the user. Unlike [`User::resolve`] a numeric uid
/// without passwd entry is accepted.
///
/// # Errors
///
/// Returns an error if a user name is unknown.
pub fn resolve_uid(arg: Option<&str>) -> io::Result<(u32, Option<User>)> {
    match arg.map(str::parse::<u32>) {
        Some(Ok(uid)) => Ok((uid, User::by_uid(uid).ok())),
        _ => User::resolve(arg).map(|u| (u.uid, Some(u))),
    }
}

/// All passwd entries with a uid of at least `min_uid`, in database order.
#[must_use]
pub fn all(min_uid: u32) -> Vec<User> {
    let mut users = Vec::new();

    // getpwent keeps its cursor in libc, which is fine for this
    // single-threaded tool.
    unsafe {
        libc::setpwent();

        loop {
            let pwd = libc::getpwent();
            if pwd.is_null() {
                break;
            }

            let user = to_user(&*pwd);
            if user.uid >= min_uid {
                users.push(user);
            }
        }

        libc::endpwent();
    }

    users
}

/// Owner of a top level entry of a filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    /// User name, or `<entry>-<uid>` when the uid has no passwd entry.
    pub label: String,
    pub resolved: bool,
}

/// Owners of the entries directly below `dir`, in directory order.
///
/// Entries that cannot be stat'ed are skipped.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn dir_owners(dir: impl AsRef<Path>) -> io::Result<Vec<Owner>> {
    let mut owners = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;

        let meta = match std::fs::metadata(entry.path()) {
            Ok(meta) => meta,
            Err(e) => {
                log::debug!("stat {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let uid = meta.uid();

        let owner = match User::by_uid(uid) {
            Ok(user) => Owner {
                uid,
                label: user.name,
                resolved: true,
            },
            Err(_) => Owner {
                uid,
                label: format!("{}-{}", entry.file_name().to_string_lossy(), uid),
                resolved: false,
            },
        };

        owners.push(owner);
    }

    Ok(owners)
}
