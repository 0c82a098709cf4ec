//! User, group and host identity queries.
//!
//! Lookups go through the reentrant libc calls (`getpwuid_r`, `getgrgid_r`,
//! `gethostname`) and run with input blocked. Unknown ids answer `None`.
//!
//! # Safety
//! This module uses unsafe code for FFI calls into libc. Every buffer handed
//! to libc outlives the call and its length is passed alongside it.

#![allow(unsafe_code)]
#![allow(clippy::borrow_as_ptr)]

use std::ffi::CStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::event::debug_log;

static INPUT_BLOCKED: AtomicUsize = AtomicUsize::new(0);

/// Upper bound on the scratch buffer for passwd and group records.
const MAX_RECORD_BUF: usize = 1 << 20;

/// Keeps input blocked while alive. Guards nest.
#[derive(Debug)]
#[must_use = "input is unblocked as soon as the guard is dropped"]
pub struct BlockInput {
    _private: (),
}

/// Block input until the returned guard is dropped.
pub fn block_input() -> BlockInput {
    INPUT_BLOCKED.fetch_add(1, Ordering::SeqCst);
    BlockInput { _private: () }
}

impl Drop for BlockInput {
    fn drop(&mut self) {
        INPUT_BLOCKED.fetch_sub(1, Ordering::SeqCst);
    }
}

/// True while any [`BlockInput`] guard is alive.
#[must_use]
pub fn input_blocked_p() -> bool {
    INPUT_BLOCKED.load(Ordering::SeqCst) > 0
}

fn c_string(p: *const libc::c_char) -> Option<String> {
    if p.is_null() {
        return None;
    }
    // SAFETY: libc returned a NUL-terminated string inside our record buffer
    Some(unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
}

#[derive(Debug)]
struct Passwd {
    name: String,
    gecos: Option<String>,
}

fn getpwuid(uid: u32) -> Option<Passwd> {
    let _block = block_input();
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        // SAFETY: passwd is plain data; zeroed is a valid initial state
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        // SAFETY: pwd, buf and result are valid for the duration of the call
        let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
        if rc == libc::ERANGE && buf.len() < MAX_RECORD_BUF {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            debug_log(|| format!("getpwuid_r({uid}) found nothing (rc {rc})"));
            return None;
        }
        return Some(Passwd {
            name: c_string(pwd.pw_name)?,
            gecos: c_string(pwd.pw_gecos),
        });
    }
}

fn getgrgid(gid: u32) -> Option<String> {
    let _block = block_input();
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        // SAFETY: group is plain data; zeroed is a valid initial state
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();
        // SAFETY: grp, buf and result are valid for the duration of the call
        let rc = unsafe { libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result) };
        if rc == libc::ERANGE && buf.len() < MAX_RECORD_BUF {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        return c_string(grp.gr_name);
    }
}

/// Effective user id.
#[must_use]
pub fn user_uid() -> u32 {
    // SAFETY: geteuid cannot fail
    unsafe { libc::geteuid() }
}

/// Real user id.
#[must_use]
pub fn user_real_uid() -> u32 {
    // SAFETY: getuid cannot fail
    unsafe { libc::getuid() }
}

/// Effective group id.
#[must_use]
pub fn group_gid() -> u32 {
    // SAFETY: getegid cannot fail
    unsafe { libc::getegid() }
}

/// Real group id.
#[must_use]
pub fn group_real_gid() -> u32 {
    // SAFETY: getgid cannot fail
    unsafe { libc::getgid() }
}

/// Login name of `uid`, or of the current user.
///
/// Without a uid, `LOGNAME` and then `USER` are consulted before the
/// password database.
#[must_use]
pub fn user_login_name(uid: Option<u32>) -> Option<String> {
    match uid {
        Some(uid) => getpwuid(uid).map(|pw| pw.name),
        None => ["LOGNAME", "USER"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .or_else(|| getpwuid(user_uid()).map(|pw| pw.name)),
    }
}

/// Login name of the real uid, ignoring the environment; `"unknown"` if
/// the password database has no entry.
#[must_use]
pub fn user_real_login_name() -> String {
    getpwuid(user_real_uid()).map_or_else(|| "unknown".to_string(), |pw| pw.name)
}

/// Full name from the GECOS field: text before the first comma, with `&`
/// standing for the capitalized login name.
fn expand_gecos(gecos: &str, login: &str) -> String {
    let full = gecos.split(',').next().unwrap_or("");
    if !full.contains('&') {
        return full.to_string();
    }
    let mut chars = login.chars();
    let capitalized: String = chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    full.replace('&', &capitalized)
}

/// Full name of `uid`, or of the current user (where `NAME` overrides the
/// password database).
#[must_use]
pub fn user_full_name(uid: Option<u32>) -> Option<String> {
    if uid.is_none() {
        if let Some(name) = std::env::var("NAME").ok().filter(|v| !v.is_empty()) {
            return Some(name);
        }
    }
    let pw = getpwuid(uid.unwrap_or_else(user_uid))?;
    Some(pw.gecos.map_or_else(String::new, |g| expand_gecos(&g, &pw.name)))
}

/// Name of group `gid`.
#[must_use]
pub fn group_name(gid: u32) -> Option<String> {
    getgrgid(gid)
}

/// Host name, with blanks turned into dashes.
#[must_use]
pub fn system_name() -> String {
    let _block = block_input();
    let mut buf: Vec<libc::c_char> = vec![0; 256];
    // SAFETY: buf is writable for buf.len() bytes; we force a trailing NUL
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr(), buf.len() - 1) };
    if rc != 0 {
        return String::new();
    }
    c_string(buf.as_ptr())
        .unwrap_or_default()
        .replace([' ', '\t'], "-")
}

/// Id of this process.
#[must_use]
pub fn emacs_pid() -> u32 {
    std::process::id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_input_nests() {
        let outer = block_input();
        assert!(input_blocked_p());
        {
            let _inner = block_input();
            assert!(input_blocked_p());
        }
        assert!(input_blocked_p());
        drop(outer);
    }

    #[test]
    fn test_expand_gecos() {
        assert_eq!(expand_gecos("Ada Lovelace,Room 1,555", "ada"), "Ada Lovelace");
        assert_eq!(expand_gecos("& Smith", "john"), "John Smith");
        assert_eq!(expand_gecos("", "x"), "");
    }

    #[test]
    fn test_ids_match_libc() {
        assert_eq!(user_real_uid(), unsafe { libc::getuid() });
        assert_eq!(group_real_gid(), unsafe { libc::getgid() });
        assert_eq!(emacs_pid(), std::process::id());
    }

    #[test]
    fn test_root_lookup() {
        assert_eq!(user_login_name(Some(0)).as_deref(), Some("root"));
        assert!(group_name(0).is_some());
    }

    #[test]
    fn test_unknown_uid() {
        assert_eq!(user_login_name(Some(3_999_999_991)), None);
        assert_eq!(user_full_name(Some(3_999_999_991)), None);
    }

    #[test]
    fn test_system_name_has_no_blanks() {
        let name = system_name();
        assert!(!name.contains(' ') && !name.contains('\t'));
    }
}
