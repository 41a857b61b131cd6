/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::collections::VecDeque;
use std::fmt;

/// The modules left over when the parent graph could not be ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CycleError {
    pub(crate) members: Vec<String>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module parents form a cycle among [{}]", self.members.join(", "))
    }
}

/// Orders batch members so every parent precedes its children.
///
/// `parent_of[i]` is the batch index of member `i`'s parent, or `None` when the parent is
/// already registered (or absent). Returns indices into `names`. Members that do not
/// depend on each other keep their input order.
pub(crate) fn parents_first(
    names: &[String],
    parent_of: &[Option<usize>],
) -> Result<Vec<usize>, CycleError> {
    let mut in_degree = vec![0_usize; names.len()];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); names.len()];

    for (child, parent) in parent_of.iter().enumerate() {
        if let Some(parent) = *parent {
            children[parent].push(child);
            in_degree[child] += 1;
        }
    }

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(i, _)| i)
        .collect();
    let mut sorted = Vec::with_capacity(names.len());

    while let Some(idx) = queue.pop_front() {
        sorted.push(idx);
        for &child in &children[idx] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if sorted.len() != names.len() {
        let members = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree > 0)
            .map(|(i, _)| names[i].clone())
            .collect();
        return Err(CycleError { members });
    }
    Ok(sorted)
}
