//! Bottom-up natural merge sort over a null-terminated chain of free nodes.
//!
//! The chain is its own storage: only `next` links are rewritten, nothing is allocated and
//! nothing recurses, so an arbitrarily long chain sorts in constant stack space.

use crate::node::FreeNode;

/// A sorted, null-terminated stretch of the chain.
#[derive(Clone, Copy)]
struct Run {
  head: FreeNode,
  tail: FreeNode,
}

/// Detaches the longest ascending run starting at `head`. Returns it with whatever follows.
fn take_run(head: FreeNode) -> (Run, Option<FreeNode>) {
  let mut tail = head;
  while let Some(next) = tail.next() {
    if next < tail {
      tail.set_next(None);
      return (Run { head, tail }, Some(next));
    }
    tail = next;
  }
  (Run { head, tail }, None)
}

fn merge(left: Run, right: Run) -> Run {
  let mut a = Some(left.head);
  let mut b = Some(right.head);
  let mut head = None;
  let mut last: Option<FreeNode> = None;

  let tail = loop {
    let pick = match (a, b) {
      (Some(x), Some(y)) if x < y => {
        a = x.next();
        x
      }
      (Some(_), Some(y)) => {
        b = y.next();
        y
      }
      (Some(rest), None) => {
        link(&mut head, last, rest);
        break left.tail;
      }
      (None, Some(rest)) => {
        link(&mut head, last, rest);
        break right.tail;
      }
      (None, None) => unreachable!("runs are never empty"),
    };
    link(&mut head, last, pick);
    last = Some(pick);
  };

  Run {
    head: head.unwrap_or(left.head),
    tail,
  }
}

fn link(head: &mut Option<FreeNode>, tail: Option<FreeNode>, node: FreeNode) {
  match tail {
    Some(tail) => tail.set_next(Some(node)),
    None => *head = Some(node),
  }
}

/// Sorts the chain starting at `head` by address and returns the new head.
pub(crate) fn sort(head: Option<FreeNode>) -> Option<FreeNode> {
  let mut head = head?;

  loop {
    let mut out: Option<Run> = None;
    let mut merged = false;
    let mut rest = Some(head);

    while let Some(first) = rest {
      let (left, after_left) = take_run(first);
      let run = match after_left {
        Some(second) => {
          let (right, after_right) = take_run(second);
          rest = after_right;
          merged = true;
          merge(left, right)
        }
        None => {
          rest = None;
          left
        }
      };

      out = Some(match out {
        Some(sorted) => {
          sorted.tail.set_next(Some(run.head));
          Run {
            head: sorted.head,
            tail: run.tail,
          }
        }
        None => run,
      });
    }

    let Some(sorted) = out else {
      return None;
    };
    if !merged {
      return Some(sorted.head);
    }
    head = sorted.head;
  }
}
