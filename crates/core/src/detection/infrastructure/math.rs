//! Union-find clustering of raw sliding-window hits.

use imageproc::rect::Rect;

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Two boxes are similar when every edge moves by at most
/// `eps · (min width + min height) / 2`.
pub fn similar_rects(a: &Rect, b: &Rect, eps: f64) -> bool {
    let delta = eps * (a.width().min(b.width()) + a.height().min(b.height())) as f64 * 0.5;
    let close = |p: i32, q: i32| ((p - q).abs() as f64) <= delta;
    close(a.left(), b.left())
        && close(a.top(), b.top())
        && close(a.right(), b.right())
        && close(a.bottom(), b.bottom())
}

/// Clusters similar boxes transitively, drops clusters with
/// `min_neighbors` members or fewer, and averages the survivors.
///
/// Returns `(averaged box, member count)` ordered by each cluster's first
/// member in the input.
pub fn group_rectangles(rects: &[Rect], min_neighbors: usize, eps: f64) -> Vec<(Rect, usize)> {
    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if similar_rects(&rects[i], &rects[j], eps) {
                union(&mut parent, i, j);
            }
        }
    }

    // (first member, count, sum x, sum y, sum w, sum h) per root
    let mut clusters: Vec<(usize, usize, i64, i64, i64, i64)> = Vec::new();
    let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
    for (i, r) in rects.iter().enumerate() {
        let root = find(&mut parent, i);
        let slot = *slot_of_root[root].get_or_insert_with(|| {
            clusters.push((i, 0, 0, 0, 0, 0));
            clusters.len() - 1
        });
        let c = &mut clusters[slot];
        c.1 += 1;
        c.2 += r.left() as i64;
        c.3 += r.top() as i64;
        c.4 += r.width() as i64;
        c.5 += r.height() as i64;
    }

    clusters
        .into_iter()
        .filter(|c| c.1 > min_neighbors)
        .map(|(_, count, sx, sy, sw, sh)| {
            let k = count as f64;
            let avg = |s: i64| (s as f64 / k).round() as i64;
            let rect = Rect::at(avg(sx) as i32, avg(sy) as i32)
                .of_size(avg(sw).max(1) as u32, avg(sh).max(1) as u32);
            (rect, count)
        })
        .collect()
}
