use std::collections::HashMap;
use std::thread;

use crossbeam_channel::{unbounded, Receiver};
use failure::{format_err, Error, Fail};
use log::*;

use crate::module::{Kind, Port};
use crate::{pipe, Config, PipeError, Transport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Fail)]
pub enum GraphError {
    #[fail(display = "no such node {:?}", _0)]
    UnknownNode(NodeId),

    #[fail(display = "{} has no {} port named {:?}", node, dir, port)]
    UnknownPort {
        node: &'static str,
        dir: &'static str,
        port: String,
    },

    #[fail(display = "input {} of {} is already connected", port, node)]
    Rewired {
        node: &'static str,
        port: &'static str,
    },

    #[fail(display = "input {} of {} is not connected", port, node)]
    Unconnected {
        node: &'static str,
        port: &'static str,
    },
}

struct Node {
    kind: Kind,
    // consumer endpoints, created when the input is wired
    inputs: Vec<Option<Port>>,
}

/// Modules and the links between them.
///
/// Port names are resolved when a link is made; an unknown or doubly wired
/// port fails right there. Every output gets one transport, shared by all
/// of its links.
pub struct Graph {
    cfg: Config,
    nodes: Vec<Node>,
    pipes: HashMap<(usize, usize), Box<dyn Transport>>,
}

fn pipe_for<'a>(
    pipes: &'a mut HashMap<(usize, usize), Box<dyn Transport>>,
    cfg: &Config,
    key: (usize, usize),
) -> Result<&'a dyn Transport, PipeError> {
    if !pipes.contains_key(&key) {
        pipes.insert(key, pipe::open(cfg.transport, cfg.batch)?);
    }
    Ok(pipes[&key].as_ref())
}

impl Graph {
    pub fn new(cfg: Config) -> Graph {
        Graph {
            cfg,
            nodes: Vec::new(),
            pipes: HashMap::new(),
        }
    }

    pub fn add(&mut self, kind: Kind) -> NodeId {
        let id = NodeId(self.nodes.len());
        debug!("adding {} as {:?}", kind.name(), id);
        self.nodes.push(Node {
            inputs: kind.inputs().iter().map(|_| None).collect(),
            kind,
        });
        id
    }

    fn output(&self, from: NodeId, out: &str) -> Result<usize, GraphError> {
        let node = self.nodes.get(from.0).ok_or(GraphError::UnknownNode(from))?;
        node.kind.output(out).ok_or_else(|| GraphError::UnknownPort {
            node: node.kind.name(),
            dir: "output",
            port: out.to_string(),
        })
    }

    /// Link output `out` of `from` to input `input` of `to`.
    pub fn connect(&mut self, from: NodeId, out: &str, to: NodeId, input: &str) -> Result<(), Error> {
        let o = self.output(from, out)?;

        let node = self.nodes.get(to.0).ok_or(GraphError::UnknownNode(to))?;
        let name = node.kind.name();
        let i = node.kind.input(input).ok_or_else(|| GraphError::UnknownPort {
            node: name,
            dir: "input",
            port: input.to_string(),
        })?;
        if node.inputs[i].is_some() {
            return Err(GraphError::Rewired {
                node: name,
                port: node.kind.inputs()[i],
            }
            .into());
        }

        let rx = pipe_for(&mut self.pipes, &self.cfg, (from.0, o))?.recver()?;
        self.nodes[to.0].inputs[i] = Some(rx);
        debug!("linked {:?}.{} -> {:?}.{}", from, out, to, input);
        Ok(())
    }

    /// An extra consumer on output `out` of `from`, handed to the caller.
    /// It has to be drained like any other consumer.
    pub fn tap(&mut self, from: NodeId, out: &str) -> Result<Port, Error> {
        let o = self.output(from, out)?;
        let rx = pipe_for(&mut self.pipes, &self.cfg, (from.0, o))?.recver()?;
        debug!("tapped {:?}.{}", from, out);
        Ok(rx)
    }

    /// Build every module and start one thread per module.
    pub fn spawn(self) -> Result<Running, Error> {
        let Graph {
            cfg,
            nodes,
            mut pipes,
        } = self;
        cfg.validate()?;

        let mut modules = Vec::with_capacity(nodes.len());
        for (id, node) in nodes.into_iter().enumerate() {
            let Node { kind, inputs } = node;

            let mut ins = Vec::with_capacity(inputs.len());
            for (i, port) in inputs.into_iter().enumerate() {
                ins.push(port.ok_or_else(|| GraphError::Unconnected {
                    node: kind.name(),
                    port: kind.inputs()[i],
                })?);
            }

            let mut outs = Vec::with_capacity(kind.outputs().len());
            for o in 0..kind.outputs().len() {
                outs.push(pipe_for(&mut pipes, &cfg, (id, o))?.sender()?);
            }

            modules.push((id, kind.build(ins, outs, &cfg)?));
        }

        let (done_tx, done) = unbounded();
        let mut threads = Vec::with_capacity(modules.len());
        for (id, mut module) in modules {
            let name = format!("{}#{}", module.name(), id);
            let done_tx = done_tx.clone();
            let thread_name = name.clone();

            let handle = thread::Builder::new().name(thread_name).spawn(move || {
                debug!("{} running", name);
                let res = module.run();
                if let Err(e) = &res {
                    error!("{} failed: {}", name, e);
                }
                let _ = done_tx.send((name, res));
            })?;
            threads.push(handle);
        }
        info!("started {} modules", threads.len());

        Ok(Running { threads, done })
    }
}

/// A started graph.
pub struct Running {
    threads: Vec<thread::JoinHandle<()>>,
    done: Receiver<(String, Result<(), Error>)>,
}

impl Running {
    pub fn modules(&self) -> usize {
        self.threads.len()
    }

    /// Block until the first module stops and return why it stopped.
    /// Modules only stop on error, so this normally never returns `Ok`.
    pub fn wait(self) -> Result<(), Error> {
        match self.done.recv() {
            Ok((name, res)) => res.map_err(|e| format_err!("{}: {}", name, e)),
            Err(_) => Err(format_err!("every module thread exited without a result")),
        }
    }
}
