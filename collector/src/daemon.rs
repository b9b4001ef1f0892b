//! Daemon mode: fork, detach from the controlling session, `chdir("/")`,
//! redirect stdio to `/dev/null`. spec.md §6.
//!
//! Uses raw `libc` calls directly, following `posix-scheduler`'s approach of
//! wrapping individual POSIX syscalls rather than pulling in a full
//! daemonizing framework.

use std::io;

/// Forks the process and detaches the child into its own session. The
/// parent exits immediately; only the child returns from this function.
#[cfg(unix)]
pub fn daemonize() -> io::Result<()> {
    unsafe {
        match libc::fork() {
            -1 => return Err(io::Error::last_os_error()),
            0 => {}                 // child continues below
            _ => std::process::exit(0), // parent exits
        }

        if libc::setsid() == -1 {
            return Err(io::Error::last_os_error());
        }

        let root = std::ffi::CString::new("/").unwrap();
        if libc::chdir(root.as_ptr()) == -1 {
            return Err(io::Error::last_os_error());
        }

        redirect_stdio_to_dev_null()?;
    }
    Ok(())
}

#[cfg(unix)]
unsafe fn redirect_stdio_to_dev_null() -> io::Result<()> {
    let dev_null = std::ffi::CString::new("/dev/null").unwrap();
    let fd = libc::open(dev_null.as_ptr(), libc::O_RDWR);
    if fd == -1 {
        return Err(io::Error::last_os_error());
    }
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        if libc::dup2(fd, target) == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    if fd > libc::STDERR_FILENO {
        libc::close(fd);
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn daemonize() -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "daemon mode requires a unix target"))
}
