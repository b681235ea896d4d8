use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

/// Opens a byte stream to a board. The drivers own the returned port and
/// reopen through the connector whenever they drop it.
pub trait SerialConnector {
    type Port: Read + Write + Send + 'static;

    fn open(&self) -> io::Result<Self::Port>;

    fn name(&self) -> &str;
}

/// Serial device node, opened read/write with the line settings left to the OS.
#[derive(Debug, Clone)]
pub struct TtyConnector {
    path: PathBuf,
    name: String,
}

impl TtyConnector {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        TtyConnector { path, name }
    }
}

impl SerialConnector for TtyConnector {
    type Port = File;

    fn open(&self) -> io::Result<Self::Port> {
        OpenOptions::new().read(true).write(true).open(&self.path)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{
        collections::VecDeque,
        io::{self, Read, Write},
        sync::{Arc, Mutex},
    };

    use super::SerialConnector;

    #[derive(Default)]
    struct Wire {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        opened: usize,
        fail_open: bool,
        fail_writes: usize,
    }

    /// In-memory board: bytes injected with `inject_rx_data` are read by the
    /// driver, bytes the driver writes end up in `tx_buffer`.
    #[derive(Clone, Default)]
    pub struct MockSerial {
        wire: Arc<Mutex<Wire>>,
    }

    impl MockSerial {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn inject_rx_data(&self, bytes: &[u8]) {
            self.wire.lock().unwrap().rx.extend(bytes);
        }

        pub fn tx_buffer(&self) -> Vec<u8> {
            self.wire.lock().unwrap().tx.clone()
        }

        pub fn open_count(&self) -> usize {
            self.wire.lock().unwrap().opened
        }

        pub fn set_fail_open(&self, fail: bool) {
            self.wire.lock().unwrap().fail_open = fail;
        }

        /// Makes the next `count` writes fail.
        pub fn fail_next_writes(&self, count: usize) {
            self.wire.lock().unwrap().fail_writes = count;
        }
    }

    pub struct MockPort {
        wire: Arc<Mutex<Wire>>,
    }

    impl Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut wire = self.wire.lock().unwrap();
            let mut count = 0;
            while count < buf.len() {
                match wire.rx.pop_front() {
                    Some(byte) => {
                        buf[count] = byte;
                        count += 1;
                    }
                    None => break,
                }
            }
            Ok(count)
        }
    }

    impl Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut wire = self.wire.lock().unwrap();
            if wire.fail_writes > 0 {
                wire.fail_writes -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
            }
            wire.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SerialConnector for MockSerial {
        type Port = MockPort;

        fn open(&self) -> io::Result<Self::Port> {
            let mut wire = self.wire.lock().unwrap();
            if wire.fail_open {
                return Err(io::Error::new(io::ErrorKind::NotFound, "mock tty missing"));
            }
            wire.opened += 1;
            Ok(MockPort {
                wire: self.wire.clone(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tty_fails_to_open() {
        let connector = TtyConnector::new("/nonexistent/ttyO9");
        assert_eq!(connector.name(), "/nonexistent/ttyO9");
        assert!(connector.open().is_err());
    }

    #[test]
    fn mock_port_moves_bytes() {
        let serial = mock::MockSerial::new();
        serial.inject_rx_data(b"navdata");
        let mut port = serial.open().unwrap();

        let mut buffer = [0_u8; 3];
        assert_eq!(port.read(&mut buffer).unwrap(), 3);
        assert_eq!(&buffer, b"nav");

        port.write_all(&[0x01]).unwrap();
        assert_eq!(serial.tx_buffer(), vec![0x01]);
        assert_eq!(serial.open_count(), 1);
    }
}
