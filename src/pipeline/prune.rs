/*!

Heuristic pre-pruning of the backhaul candidate link set (SPEC_FULL.md §B),
used by the redundancy phase's min-cost-with-redundancy variant to cut the
MILP's link universe down before the expensive two-phase LP. A backhaul link
survives pruning if either:

- it is an edge of the Delaunay triangulation over POP/DN site positions
  ([`delaunay_edges`]), the standard "keep your natural neighbors" heuristic, or
- it carries flow in a unit-capacity, site-split max-flow from every POP to
  every DN ([`dinic_max_flow`]), meaning it is part of some vertex-disjoint
  reinforcing path.

Access links (DN→CN) are never pruned: the redundancy phase only needs
backhaul choices trimmed, per spec.md §4.7 step 4's backhaul-redundancy
framing.

*/

use std::collections::{BTreeSet, VecDeque};

use crate::geometry::Point2;
use crate::graph::{CandidateGraph, EntityId, LinkKind, SiteType};

///Returns the subset of `graph`'s link ids that the redundancy phase's
///min-cost-with-redundancy variant should build its LP over.
pub fn prune_candidate_links(graph:&CandidateGraph) -> BTreeSet<EntityId>
{
	let mut keep: BTreeSet<EntityId> = BTreeSet::new();

	for link in graph.links.values()
	{
		if link.kind == LinkKind::Access
		{
			keep.insert(link.id);
		}
	}

	let backhaul_sites: Vec<EntityId> = graph.sites.values()
		.filter(|s|matches!(s.site_type, SiteType::Pop|SiteType::Dn))
		.map(|s|s.id)
		.collect();

	if backhaul_sites.len() >= 3
	{
		let points: Vec<Point2> = backhaul_sites.iter()
			.map(|id|graph.sites[id].position.horizontal())
			.collect();
		let edges = delaunay_edges(&points);
		for (i,j) in edges
		{
			let (a,b) = (backhaul_sites[i],backhaul_sites[j]);
			if let Some(link) = graph.links.values().find(|l|l.kind==LinkKind::Backhaul && ((l.from==a && l.to==b)||(l.from==b && l.to==a)))
			{
				keep.insert(link.id);
				if let Some(reverse) = graph.links.values().find(|l|l.kind==LinkKind::Backhaul && l.from==link.to && l.to==link.from)
				{
					keep.insert(reverse.id);
				}
			}
		}
	}

	for link_id in flow_backbone_links(graph,&backhaul_sites)
	{
		keep.insert(link_id);
	}

	keep
}

///Unit-capacity, site-split max-flow (SPEC_FULL.md §B) from a super-source
///feeding every POP to a super-sink fed by every DN, one path credit per DN.
///Returns the backhaul link ids carrying flow in the resulting solution.
fn flow_backbone_links(graph:&CandidateGraph, backhaul_sites:&[EntityId]) -> BTreeSet<EntityId>
{
	let index: std::collections::BTreeMap<EntityId,usize> = backhaul_sites.iter().enumerate().map(|(i,id)|(*id,i)).collect();
	let n = backhaul_sites.len();
	if n == 0
	{
		return BTreeSet::new();
	}

	//Node layout: site i's "in" copy is 2*i, "out" copy is 2*i+1, joined by a
	//capacity-1 edge (the "splitting" that prevents a site from anchoring more
	//than one disjoint path). Source is 2*n, sink is 2*n+1.
	let source = 2*n;
	let sink = 2*n+1;
	let mut graph_flow = DinicGraph::new(2*n+2);

	for i in 0..n
	{
		graph_flow.add_edge(2*i, 2*i+1, 1);
	}

	let mut backhaul_link_of_edge: std::collections::BTreeMap<(usize,usize),EntityId> = std::collections::BTreeMap::new();
	for link in graph.links.values()
	{
		if link.kind != LinkKind::Backhaul
		{
			continue;
		}
		let (Some(&i),Some(&j)) = (index.get(&link.from),index.get(&link.to)) else { continue };
		graph_flow.add_edge(2*i+1, 2*j, 1);
		backhaul_link_of_edge.insert((2*i+1,2*j), link.id);
	}

	for (site_id,&i) in &index
	{
		match graph.sites[site_id].site_type
		{
			SiteType::Pop => graph_flow.add_edge(source, 2*i, i64::MAX/4),
			SiteType::Dn => graph_flow.add_edge(2*i+1, sink, 1),
			_ => {}
		}
	}

	graph_flow.max_flow(source,sink);

	let mut used = BTreeSet::new();
	for (&(u,v), &link_id) in &backhaul_link_of_edge
	{
		if graph_flow.edge_flow(u,v) > 0
		{
			used.insert(link_id);
		}
	}
	used
}

///A minimal adjacency-list Dinic max-flow implementation over integer
///capacities.
struct DinicGraph
{
	adjacency: Vec<Vec<usize>>,
	to: Vec<usize>,
	cap: Vec<i64>,
}

impl DinicGraph
{
	fn new(num_nodes:usize) -> DinicGraph
	{
		DinicGraph{ adjacency: vec![Vec::new();num_nodes], to: Vec::new(), cap: Vec::new() }
	}

	fn add_edge(&mut self, u:usize, v:usize, capacity:i64)
	{
		let uv = self.to.len();
		self.to.push(v);
		self.cap.push(capacity);
		self.adjacency[u].push(uv);

		let vu = self.to.len();
		self.to.push(u);
		self.cap.push(0);
		self.adjacency[v].push(vu);
	}

	///Flow actually sent along the edge `u -> v`, found by looking up its
	///reverse edge's residual capacity (the reverse edge started at 0 and
	///gains capacity equal to whatever flow crossed the forward edge).
	fn edge_flow(&self, u:usize, v:usize) -> i64
	{
		for &eid in &self.adjacency[u]
		{
			if self.to[eid]==v
			{
				let rev = eid^1;
				return self.cap[rev];
			}
		}
		0
	}

	fn bfs_levels(&self, source:usize, n:usize) -> Vec<i32>
	{
		let mut level = vec![-1;n];
		level[source] = 0;
		let mut queue = VecDeque::new();
		queue.push_back(source);
		while let Some(u) = queue.pop_front()
		{
			for &eid in &self.adjacency[u]
			{
				let v = self.to[eid];
				if self.cap[eid] > 0 && level[v] < 0
				{
					level[v] = level[u]+1;
					queue.push_back(v);
				}
			}
		}
		level
	}

	fn dfs_blocking(&mut self, u:usize, sink:usize, pushed:i64, level:&[i32], iter:&mut [usize]) -> i64
	{
		if u==sink || pushed==0
		{
			return pushed;
		}
		while iter[u] < self.adjacency[u].len()
		{
			let eid = self.adjacency[u][iter[u]];
			let v = self.to[eid];
			if self.cap[eid] > 0 && level[v]==level[u]+1
			{
				let through = self.dfs_blocking(v,sink,pushed.min(self.cap[eid]),level,iter);
				if through > 0
				{
					self.cap[eid] -= through;
					self.cap[eid^1] += through;
					return through;
				}
			}
			iter[u] += 1;
		}
		0
	}

	fn max_flow(&mut self, source:usize, sink:usize) -> i64
	{
		let n = self.adjacency.len();
		let mut total = 0;
		loop
		{
			let level = self.bfs_levels(source,n);
			if level[sink] < 0
			{
				break;
			}
			let mut iter = vec![0usize;n];
			loop
			{
				let pushed = self.dfs_blocking(source,sink,i64::MAX/4,&level,&mut iter);
				if pushed==0
				{
					break;
				}
				total += pushed;
			}
		}
		total
	}
}

///Bowyer-Watson incremental Delaunay triangulation, returning triangulation
///edges as index pairs into `points`. No external geometry-kernel dependency
///(SPEC_FULL.md §B): this is a from-scratch, self-contained implementation.
pub fn delaunay_edges(points:&[Point2]) -> Vec<(usize,usize)>
{
	let n = points.len();
	if n < 3
	{
		return Vec::new();
	}

	let (min_x,max_x) = points.iter().fold((f64::INFINITY,f64::NEG_INFINITY),|(lo,hi),p|(lo.min(p.x),hi.max(p.x)));
	let (min_y,max_y) = points.iter().fold((f64::INFINITY,f64::NEG_INFINITY),|(lo,hi),p|(lo.min(p.y),hi.max(p.y)));
	let dx = (max_x-min_x).max(1.0);
	let dy = (max_y-min_y).max(1.0);
	let mid_x = (min_x+max_x)/2.0;
	let mid_y = (min_y+max_y)/2.0;
	let span = dx.max(dy)*20.0+10.0;

	let mut all_points: Vec<Point2> = points.to_vec();
	let super_a = all_points.len(); all_points.push(Point2::new(mid_x-span, mid_y-span));
	let super_b = all_points.len(); all_points.push(Point2::new(mid_x+span, mid_y-span));
	let super_c = all_points.len(); all_points.push(Point2::new(mid_x, mid_y+span));

	let mut triangles: Vec<(usize,usize,usize)> = vec![(super_a,super_b,super_c)];

	for i in 0..n
	{
		let mut bad: Vec<usize> = Vec::new();
		for (ti,&tri) in triangles.iter().enumerate()
		{
			if circumcircle_contains(&all_points,tri,all_points[i])
			{
				bad.push(ti);
			}
		}

		//Polygon boundary: edges of bad triangles that aren't shared by two bad triangles.
		let mut edge_count: std::collections::BTreeMap<(usize,usize),u32> = std::collections::BTreeMap::new();
		for &ti in &bad
		{
			let (a,b,c) = triangles[ti];
			for (p,q) in [(a,b),(b,c),(c,a)]
			{
				let key = if p<q {(p,q)} else {(q,p)};
				*edge_count.entry(key).or_insert(0) += 1;
			}
		}
		let boundary: Vec<(usize,usize)> = edge_count.into_iter().filter(|(_,count)|*count==1).map(|(e,_)|e).collect();

		let mut kept: Vec<(usize,usize,usize)> = Vec::with_capacity(triangles.len());
		for (ti,tri) in triangles.into_iter().enumerate()
		{
			if !bad.contains(&ti)
			{
				kept.push(tri);
			}
		}
		triangles = kept;

		for (p,q) in boundary
		{
			triangles.push((p,q,i));
		}
	}

	triangles.retain(|&(a,b,c)| a!=super_a && a!=super_b && a!=super_c && b!=super_a && b!=super_b && b!=super_c && c!=super_a && c!=super_b && c!=super_c);

	let mut edges: BTreeSet<(usize,usize)> = BTreeSet::new();
	for (a,b,c) in triangles
	{
		for (p,q) in [(a,b),(b,c),(c,a)]
		{
			edges.insert(if p<q {(p,q)} else {(q,p)});
		}
	}
	edges.into_iter().collect()
}

///Whether `p` lies inside the circumcircle of triangle `tri`, via the
///standard determinant test (assumes `tri` is given in either winding order;
///the determinant's sign convention is handled by always comparing against
///zero after orienting the triangle counter-clockwise).
fn circumcircle_contains(points:&[Point2], tri:(usize,usize,usize), p:Point2) -> bool
{
	let (a,b,c) = (points[tri.0],points[tri.1],points[tri.2]);
	let area2 = (b.x-a.x)*(c.y-a.y) - (c.x-a.x)*(b.y-a.y);
	let (a,b,c) = if area2 < 0.0 { (a,c,b) } else { (a,b,c) };

	let ax = a.x-p.x; let ay = a.y-p.y;
	let bx = b.x-p.x; let by = b.y-p.y;
	let cx = c.x-p.x; let cy = c.y-p.y;

	let det =
		(ax*ax+ay*ay)*(bx*cy-cx*by) -
		(bx*bx+by*by)*(ax*cy-cx*ay) +
		(cx*cx+cy*cy)*(ax*by-bx*ay);

	det > 0.0
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn square_triangulation_has_no_isolated_points()
	{
		let points = vec![
			Point2::new(0.0,0.0),
			Point2::new(10.0,0.0),
			Point2::new(10.0,10.0),
			Point2::new(0.0,10.0),
		];
		let edges = delaunay_edges(&points);
		assert!(!edges.is_empty());
		let mut touched: BTreeSet<usize> = BTreeSet::new();
		for (a,b) in &edges
		{
			touched.insert(*a);
			touched.insert(*b);
		}
		assert_eq!(touched.len(),4);
	}

	#[test]
	fn fewer_than_three_points_yields_no_edges()
	{
		let points = vec![Point2::new(0.0,0.0),Point2::new(1.0,1.0)];
		assert!(delaunay_edges(&points).is_empty());
	}

	#[test]
	fn dinic_finds_unit_capacity_max_flow_through_disjoint_paths()
	{
		//source -> a -> sink, source -> b -> sink, each edge capacity 1: max flow 2.
		let mut g = DinicGraph::new(4);
		let (source,a,b,sink) = (0,1,2,3);
		g.add_edge(source,a,1);
		g.add_edge(source,b,1);
		g.add_edge(a,sink,1);
		g.add_edge(b,sink,1);
		assert_eq!(g.max_flow(source,sink), 2);
	}
}
