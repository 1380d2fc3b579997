extern crate regpath;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use regpath::defs::{ByteOrder, WordSize};
use regpath::error::{Error, Result};
use regpath::prelude::*;
use regpath::tree::{DeviceTree, FieldInfo, NodeSpec, TreeBuilder};
use regpath::value::{completion, AsyncDispatcher, MemDevice, ValueAccessor, ValueSequence};

/// A device that is never there.
#[derive(Debug)]
struct Unplugged;

impl Transport for Unplugged {
    fn read(&self, offset: u64, _buf: &mut [u8]) -> Result<()> {
        Err(Error::Io(format!("no response reading {:#x}", offset)))
    }

    fn write(&self, offset: u64, _buf: &[u8]) -> Result<()> {
        Err(Error::Io(format!("no response writing {:#x}", offset)))
    }

    fn size(&self) -> u64 {
        0x1000
    }
}

/// Memory that logs the spans it is asked to read.
#[derive(Debug)]
struct Logged {
    mem: MemDevice,
    reads: Mutex<Vec<(u64, usize)>>,
}

impl Transport for Logged {
    fn read(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.reads.lock().push((offset, buf.len()));
        self.mem.read(offset, buf)
    }

    fn write(&self, offset: u64, buf: &[u8]) -> Result<()> {
        self.mem.write(offset, buf)
    }

    fn size(&self) -> u64 {
        self.mem.size()
    }
}

/// Blocks every read until released.
#[derive(Debug)]
struct Stalled {
    release: Mutex<Receiver<()>>,
}

impl Transport for Stalled {
    fn read(&self, _offset: u64, buf: &mut [u8]) -> Result<()> {
        let _ = self.release.lock().recv();
        buf.iter_mut().for_each(|b| *b = 0);
        Ok(())
    }

    fn write(&self, _offset: u64, _buf: &[u8]) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> u64 {
        0x100
    }
}

fn tree() -> Arc<DeviceTree> {
    let info = FieldInfo {
        word: WordSize::U32,
        signed: false,
        byte_order: ByteOrder::LE,
    };
    let mut b = TreeBuilder::new();
    b.begin_node(NodeSpec::hub("root")).unwrap();
    b.begin_node(
        NodeSpec::hub("mem")
            .size(0x1000)
            .transport(Arc::new(MemDevice::new(0x1000))),
    )
    .unwrap();
    b.add_node(NodeSpec::field("regs", info).nelms(64)).unwrap();
    b.add_node(NodeSpec::field("ctl", info).offset(0x800)).unwrap();
    b.end_node().unwrap();
    b.begin_node(NodeSpec::hub("gone").transport(Arc::new(Unplugged)))
        .unwrap();
    b.add_node(NodeSpec::field("regs", info).nelms(4)).unwrap();
    b.end_node().unwrap();
    b.end_node().unwrap();
    b.build().unwrap()
}

fn accessor(tree: &Arc<DeviceTree>, spec: &str) -> ValueAccessor {
    ValueAccessor::new(&Path::new(tree).find_by_name(spec).unwrap()).unwrap()
}

#[test]
fn sync_and_async_agree() {
    let tree = tree();
    let regs = accessor(&tree, "mem/regs");
    let values: Vec<u64> = (0..64).map(|i| i * 3).collect();
    regs.set_val(&values).unwrap();

    let (done, waiter) = completion();
    regs.get_val_async(done).unwrap();
    assert_eq!(waiter.wait_result().unwrap(), regs.get_val().unwrap());
    assert_eq!(regs.get_val().unwrap(), values);

    let part = accessor(&tree, "mem/regs[60-63]");
    assert_eq!(part.get_val().unwrap(), [180, 183, 186, 189]);
    assert_eq!(part.get_val_as::<u16>().unwrap(), [180u16, 183, 186, 189]);
}

#[test]
fn transport_failure_reported_once() {
    let tree = tree();
    let gone = accessor(&tree, "gone/regs");
    assert!(gone.get_val().unwrap_err().is_io());
    assert!(gone.set_all(1).unwrap_err().is_io());

    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = unbounded();
    let c = Arc::clone(&calls);
    gone.get_val_async(move |vals: ValueSequence, status: Option<Error>| {
        c.fetch_add(1, Ordering::SeqCst);
        tx.send((vals, status)).unwrap();
    })
    .unwrap();

    let (vals, status) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(vals.is_empty());
    assert!(status.unwrap().is_io());
    thread::sleep(Duration::from_millis(20));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn callback_never_runs_on_caller_thread() {
    let tree = tree();
    let ctl = accessor(&tree, "mem/ctl");
    ctl.set_all(0xdead_beef).unwrap();

    let caller = thread::current().id();
    let (tx, rx) = unbounded();
    ctl.get_val_async(move |vals: ValueSequence, _: Option<Error>| {
        tx.send((thread::current().id(), vals)).unwrap();
    })
    .unwrap();
    let (worker, vals) = rx.recv().unwrap();
    assert_ne!(worker, caller);
    assert_eq!(vals, [0xdead_beef]);
}

#[test]
fn many_reads_in_flight() {
    let tree = tree();
    let dispatcher = AsyncDispatcher::new();
    let regs = accessor(&tree, "mem/regs");
    regs.set_all(7).unwrap();
    let ctl = accessor(&tree, "mem/ctl");
    ctl.set_all(9).unwrap();

    let waiters: Vec<_> = (0..16)
        .map(|i| {
            let (done, waiter) = completion();
            let acc = if i % 2 == 0 { &regs } else { &ctl };
            acc.get_val_async_on(&dispatcher, done).unwrap();
            (i, waiter)
        })
        .collect();

    for (i, waiter) in waiters {
        let vals = waiter.wait_result().unwrap();
        if i % 2 == 0 {
            assert_eq!(vals, vec![7; 64]);
        } else {
            assert_eq!(vals, [9]);
        }
    }
}

#[test]
fn accessors_are_shared_between_threads() {
    let tree = tree();
    let regs = accessor(&tree, "mem/regs");
    regs.set_all(0).unwrap();

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let path = Path::new(&tree)
                .find_by_name(&format!("mem/regs[{}-{}]", t * 16, t * 16 + 15))
                .unwrap();
            thread::spawn(move || {
                let acc = ValueAccessor::new(&path).unwrap();
                acc.set_all(u64::from(t) + 1).unwrap();
                acc.get_val().unwrap()
            })
        })
        .collect();
    for (t, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap(), vec![t as u64 + 1; 16]);
    }
    let all = regs.get_val().unwrap();
    assert_eq!(all[15], 1);
    assert_eq!(all[63], 4);
}

#[test]
fn strided_reads_skip_the_gaps() {
    let info = FieldInfo {
        word: WordSize::U16,
        signed: false,
        byte_order: ByteOrder::BE,
    };
    let dev = Arc::new(Logged {
        mem: MemDevice::new(0x1000),
        reads: Mutex::new(Vec::new()),
    });
    let mut b = TreeBuilder::new();
    b.begin_node(NodeSpec::hub("dev").transport(dev.clone()))
        .unwrap();
    b.add_node(NodeSpec::field("sparse", info).nelms(4).offset(0x10).stride(0x400))
        .unwrap();
    b.end_node().unwrap();
    let tree = b.build().unwrap();

    let sparse = accessor(&tree, "sparse");
    sparse.set_val(&[0x1111, 0x2222, 0x3333, 0x4444]).unwrap();
    dev.reads.lock().clear();

    assert_eq!(sparse.get_val().unwrap(), [0x1111, 0x2222, 0x3333, 0x4444]);
    assert_eq!(
        *dev.reads.lock(),
        [(0x10, 2), (0x410, 2), (0x810, 2), (0xc10, 2)]
    );

    dev.reads.lock().clear();
    let (done, waiter) = completion();
    accessor(&tree, "sparse[1-2]").get_val_async(done).unwrap();
    assert_eq!(waiter.wait_result().unwrap(), [0x2222, 0x3333]);
    assert_eq!(*dev.reads.lock(), [(0x410, 2), (0x810, 2)]);
}

#[test]
fn callbacks_may_wait_for_other_reads() {
    let tree = tree();
    let regs = accessor(&tree, "mem/regs[0-1]");
    regs.set_val(&[4, 5]).unwrap();
    let ctl = accessor(&tree, "mem/ctl");
    ctl.set_all(6).unwrap();

    let (tx, rx) = bounded(1);
    regs.get_val_async(move |outer: ValueSequence, _: Option<Error>| {
        let (done, waiter) = completion();
        let inner = ctl
            .get_val_async(done)
            .ok()
            .and_then(|()| waiter.wait_timeout(Duration::from_secs(5)).ok());
        tx.send((outer, inner.map(|(vals, _)| vals))).unwrap();
    })
    .unwrap();

    let (outer, inner) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(outer, [4, 5]);
    assert_eq!(inner, Some(vec![6]));
}

#[test]
fn a_stalled_device_does_not_hold_up_others() {
    let tree = tree();
    let (release, gate) = bounded::<()>(0);
    let info = FieldInfo::default();
    let mut b = TreeBuilder::new();
    b.begin_node(NodeSpec::hub("slow").transport(Arc::new(Stalled {
        release: Mutex::new(gate),
    })))
    .unwrap();
    b.add_node(NodeSpec::field("r", info)).unwrap();
    b.end_node().unwrap();
    let slow_tree = b.build().unwrap();

    let (slow_done, slow_waiter) = completion();
    accessor(&slow_tree, "r").get_val_async(slow_done).unwrap();

    let fast = accessor(&tree, "mem/ctl");
    fast.set_all(3).unwrap();
    let (done, waiter) = completion();
    fast.get_val_async(done).unwrap();
    let (vals, status) = waiter
        .wait_timeout(Duration::from_secs(5))
        .unwrap_or_else(|_| panic!("read stuck behind a stalled device"));
    assert!(status.is_none());
    assert_eq!(vals, [3]);

    drop(release);
    assert_eq!(slow_waiter.wait_result().unwrap(), [0]);
}
